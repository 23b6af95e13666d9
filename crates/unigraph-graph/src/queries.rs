//! Read operations: keyed lookups, listings, and the fixed aggregations.

use unigraph_core::{
    Branch, BranchDegreeCount, BranchDegrees, Campus, Degree, DegreeAboveAverage, Faculty,
    FacultyDegreeCount, PartnerInstitution, RejectedApplicationsByCampus, School, SchoolDegrees,
    WideInt,
};

use crate::catalog::{traced, Catalog};
use crate::error::Result;
use crate::statement::{Row, Statement};
use crate::store::GraphStore;

impl<S: GraphStore> Catalog<S> {
    // ── Keyed Lookups ────────────────────────────────────────────

    pub async fn get_degree_by_code(&self, code: &str) -> Result<Degree> {
        traced("getDegreeByCode", self.get(code)).await
    }

    pub async fn get_campus_by_name(&self, name: &str) -> Result<Campus> {
        traced("getCampusByName", self.get(name)).await
    }

    pub async fn get_branch_by_name(&self, name: &str) -> Result<Branch> {
        traced("getBranchByName", self.get(name)).await
    }

    pub async fn get_faculty_by_name(&self, name: &str) -> Result<Faculty> {
        traced("getFacultyByName", self.get(name)).await
    }

    pub async fn get_school_by_name(&self, name: &str) -> Result<School> {
        traced("getSchoolByName", self.get(name)).await
    }

    pub async fn get_partner_institution_by_name(&self, name: &str) -> Result<PartnerInstitution> {
        traced("getPartnerInstitutionByName", self.get(name)).await
    }

    // ── List Queries ─────────────────────────────────────────────

    pub async fn degrees(&self) -> Result<Vec<Degree>> {
        traced("degrees", self.list()).await
    }

    pub async fn campuses(&self) -> Result<Vec<Campus>> {
        traced("campuses", self.list()).await
    }

    pub async fn branches(&self) -> Result<Vec<Branch>> {
        traced("branches", self.list()).await
    }

    pub async fn faculties(&self) -> Result<Vec<Faculty>> {
        traced("faculties", self.list()).await
    }

    pub async fn partner_institutions(&self) -> Result<Vec<PartnerInstitution>> {
        traced("partner_institutions", self.list()).await
    }

    pub async fn schools(&self) -> Result<Vec<School>> {
        traced("schools", self.list()).await
    }

    // ── Aggregations ─────────────────────────────────────────────

    /// Degrees taught per Faculty, most first.
    pub async fn degrees_count_by_faculty(&self) -> Result<Vec<FacultyDegreeCount>> {
        traced("degreesCountByFaculty", async {
            let rows = self.execute(Statement::degree_count_by_faculty()).await?;
            rows.iter()
                .map(|row| {
                    Ok(FacultyDegreeCount {
                        faculty: row.decode("faculty")?,
                        degree_count: row.decode("degree_count")?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    /// Degrees typed with each Branch, most first.
    pub async fn degrees_count_by_branch(&self) -> Result<Vec<BranchDegreeCount>> {
        traced("degreesCountByBranch", async {
            let rows = self.execute(Statement::degree_count_by_branch()).await?;
            rows.iter()
                .map(|row| {
                    Ok(BranchDegreeCount {
                        branch: row.decode("branch")?,
                        degree_count: row.decode("degree_count")?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    pub async fn branches_with_degrees(&self) -> Result<Vec<BranchDegrees>> {
        traced("branchesWithDegrees", async {
            let rows = self.execute(Statement::branches_with_degrees()).await?;
            rows.iter()
                .map(|row| {
                    Ok(BranchDegrees {
                        branch: row.decode("branch")?,
                        degrees: degree_names(row)?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    pub async fn schools_with_degrees(&self) -> Result<Vec<SchoolDegrees>> {
        traced("schoolsWithDegrees", async {
            let rows = self.execute(Statement::schools_with_degrees()).await?;
            rows.iter()
                .map(|row| {
                    Ok(SchoolDegrees {
                        school: row.decode("school")?,
                        degrees: degree_names(row)?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    /// Names of degrees taught by Schools located in `campus_name`.
    /// A degree taught by several such Schools appears once per School.
    pub async fn degrees_by_campus(&self, campus_name: &str) -> Result<Vec<String>> {
        traced("degreesByCampus", async {
            let rows = self
                .execute(Statement::degrees_by_campus(campus_name))
                .await?;
            rows.iter()
                .filter_map(|row| row.decode::<Option<String>>("degree").transpose())
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    /// Mean of `applications - students_first_year_2013` per Campus, over
    /// degrees taught by anything located in that Campus.
    pub async fn average_rejected_applications_by_campus(
        &self,
    ) -> Result<Vec<RejectedApplicationsByCampus>> {
        traced("averageRejectedApplicationsByCampus", async {
            let rows = self.execute(Statement::average_rejected_by_campus()).await?;
            rows.iter()
                .map(|row| {
                    Ok(RejectedApplicationsByCampus {
                        campus: row.decode("campus")?,
                        rejected: row.decode("rejected")?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    /// Degrees whose credits strictly exceed the mean over all degrees.
    pub async fn degrees_above_average_credits(&self) -> Result<Vec<DegreeAboveAverage>> {
        traced("degreesAboveAverageCredits", async {
            let rows = self
                .execute(Statement::degrees_above_average_credits())
                .await?;
            rows.iter()
                .map(|row| {
                    Ok(DegreeAboveAverage {
                        code: row.decode("code")?,
                        name: row.decode("name")?,
                        credits: WideInt::from_store_value(row.get("credits"))?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }
}

fn degree_names(row: &Row) -> Result<Vec<String>> {
    Ok(row
        .decode::<Option<Vec<String>>>("degrees")?
        .unwrap_or_default())
}
