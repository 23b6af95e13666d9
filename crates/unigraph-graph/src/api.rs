//! Named API operations.
//!
//! An [`Operation`] is one query or mutation, addressed by its API name and
//! carrying its arguments:
//!
//! ```json
//! {"operation": "teachDegreeToSchool", "args": {"schoolName": "ETSI", "degreeCode": "G1"}}
//! ```
//!
//! Create and update take the entity itself as `args`. Entities serialize
//! wide integers as decimal strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unigraph_core::{Branch, Campus, Degree, Faculty, PartnerInstitution, School};

use crate::catalog::Catalog;
use crate::error::{GraphError, Result};
use crate::store::GraphStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "args", rename_all = "camelCase")]
pub enum Operation {
    // Queries
    Degrees,
    Campuses,
    Branches,
    Faculties,
    #[serde(rename = "partner_institutions")]
    PartnerInstitutions,
    Schools,
    DegreesCountByFaculty,
    BranchesWithDegrees,
    #[serde(rename_all = "camelCase")]
    DegreesByCampus {
        campus_name: String,
    },
    SchoolsWithDegrees,
    DegreesCountByBranch,
    AverageRejectedApplicationsByCampus,
    DegreesAboveAverageCredits,
    GetDegreeByCode {
        code: String,
    },
    GetCampusByName {
        name: String,
    },
    GetFacultyByName {
        name: String,
    },
    GetBranchByName {
        name: String,
    },
    GetSchoolByName {
        name: String,
    },
    GetPartnerInstitutionByName {
        name: String,
    },

    // Mutations
    CreateDegree(Degree),
    CreateCampus(Campus),
    CreateBranch(Branch),
    CreateFaculty(Faculty),
    #[serde(rename = "createPartner_institution")]
    CreatePartnerInstitution(PartnerInstitution),
    CreateSchool(School),
    UpdateDegree(Degree),
    UpdateCampus(Campus),
    UpdateBranch(Branch),
    UpdateFaculty(Faculty),
    UpdatePartnerInstitution(PartnerInstitution),
    UpdateSchool(School),
    DeleteDegree {
        code: String,
    },
    DeleteCampus {
        name: String,
    },
    DeleteBranch {
        name: String,
    },
    DeleteFaculty {
        name: String,
    },
    DeletePartnerInstitution {
        name: String,
    },
    DeleteSchool {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    TeachDegreeToSchool {
        school_name: String,
        degree_code: String,
    },
    #[serde(rename_all = "camelCase")]
    TeachDegreeToFaculty {
        faculty_name: String,
        degree_code: String,
    },
    #[serde(rename_all = "camelCase")]
    TeachDegreeToPartnerInstitution {
        partner_name: String,
        degree_code: String,
    },
    #[serde(rename_all = "camelCase")]
    LocateSchoolInCampus {
        school_name: String,
        campus_name: String,
    },
    #[serde(rename_all = "camelCase")]
    LocateFacultyInCampus {
        faculty_name: String,
        campus_name: String,
    },
    #[serde(rename_all = "camelCase")]
    LocatePartnerInstitutionInCampus {
        partner_name: String,
        campus_name: String,
    },
    #[serde(rename_all = "camelCase")]
    TypeDegreeWithBranch {
        degree_code: String,
        branch_name: String,
    },
}

impl Operation {
    /// Parse an operation document. Unknown names, missing arguments, and
    /// malformed wide integers are validation errors.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| GraphError::Validation(e.to_string()))
    }

    pub fn is_mutation(&self) -> bool {
        use Operation::*;
        matches!(
            self,
            CreateDegree(_)
                | CreateCampus(_)
                | CreateBranch(_)
                | CreateFaculty(_)
                | CreatePartnerInstitution(_)
                | CreateSchool(_)
                | UpdateDegree(_)
                | UpdateCampus(_)
                | UpdateBranch(_)
                | UpdateFaculty(_)
                | UpdatePartnerInstitution(_)
                | UpdateSchool(_)
                | DeleteDegree { .. }
                | DeleteCampus { .. }
                | DeleteBranch { .. }
                | DeleteFaculty { .. }
                | DeletePartnerInstitution { .. }
                | DeleteSchool { .. }
                | TeachDegreeToSchool { .. }
                | TeachDegreeToFaculty { .. }
                | TeachDegreeToPartnerInstitution { .. }
                | LocateSchoolInCampus { .. }
                | LocateFacultyInCampus { .. }
                | LocatePartnerInstitutionInCampus { .. }
                | TypeDegreeWithBranch { .. }
        )
    }
}

/// Run one operation and serialize its result.
pub async fn dispatch<S: GraphStore>(catalog: &Catalog<S>, op: Operation) -> Result<Value> {
    use Operation::*;
    let value = match op {
        Degrees => to_json(catalog.degrees().await?)?,
        Campuses => to_json(catalog.campuses().await?)?,
        Branches => to_json(catalog.branches().await?)?,
        Faculties => to_json(catalog.faculties().await?)?,
        PartnerInstitutions => to_json(catalog.partner_institutions().await?)?,
        Schools => to_json(catalog.schools().await?)?,
        DegreesCountByFaculty => to_json(catalog.degrees_count_by_faculty().await?)?,
        BranchesWithDegrees => to_json(catalog.branches_with_degrees().await?)?,
        DegreesByCampus { campus_name } => {
            to_json(catalog.degrees_by_campus(&campus_name).await?)?
        }
        SchoolsWithDegrees => to_json(catalog.schools_with_degrees().await?)?,
        DegreesCountByBranch => to_json(catalog.degrees_count_by_branch().await?)?,
        AverageRejectedApplicationsByCampus => {
            to_json(catalog.average_rejected_applications_by_campus().await?)?
        }
        DegreesAboveAverageCredits => to_json(catalog.degrees_above_average_credits().await?)?,
        GetDegreeByCode { code } => to_json(catalog.get_degree_by_code(&code).await?)?,
        GetCampusByName { name } => to_json(catalog.get_campus_by_name(&name).await?)?,
        GetFacultyByName { name } => to_json(catalog.get_faculty_by_name(&name).await?)?,
        GetBranchByName { name } => to_json(catalog.get_branch_by_name(&name).await?)?,
        GetSchoolByName { name } => to_json(catalog.get_school_by_name(&name).await?)?,
        GetPartnerInstitutionByName { name } => {
            to_json(catalog.get_partner_institution_by_name(&name).await?)?
        }

        CreateDegree(d) => to_json(catalog.create_degree(&d).await?)?,
        CreateCampus(c) => to_json(catalog.create_campus(&c).await?)?,
        CreateBranch(b) => to_json(catalog.create_branch(&b).await?)?,
        CreateFaculty(f) => to_json(catalog.create_faculty(&f).await?)?,
        CreatePartnerInstitution(p) => to_json(catalog.create_partner_institution(&p).await?)?,
        CreateSchool(s) => to_json(catalog.create_school(&s).await?)?,
        UpdateDegree(d) => to_json(catalog.update_degree(&d).await?)?,
        UpdateCampus(c) => to_json(catalog.update_campus(&c).await?)?,
        UpdateBranch(b) => to_json(catalog.update_branch(&b).await?)?,
        UpdateFaculty(f) => to_json(catalog.update_faculty(&f).await?)?,
        UpdatePartnerInstitution(p) => to_json(catalog.update_partner_institution(&p).await?)?,
        UpdateSchool(s) => to_json(catalog.update_school(&s).await?)?,
        DeleteDegree { code } => Value::String(catalog.delete_degree(&code).await?),
        DeleteCampus { name } => Value::String(catalog.delete_campus(&name).await?),
        DeleteBranch { name } => Value::String(catalog.delete_branch(&name).await?),
        DeleteFaculty { name } => Value::String(catalog.delete_faculty(&name).await?),
        DeletePartnerInstitution { name } => {
            Value::String(catalog.delete_partner_institution(&name).await?)
        }
        DeleteSchool { name } => Value::String(catalog.delete_school(&name).await?),
        TeachDegreeToSchool {
            school_name,
            degree_code,
        } => Value::String(
            catalog
                .teach_degree_to_school(&school_name, &degree_code)
                .await?,
        ),
        TeachDegreeToFaculty {
            faculty_name,
            degree_code,
        } => Value::String(
            catalog
                .teach_degree_to_faculty(&faculty_name, &degree_code)
                .await?,
        ),
        TeachDegreeToPartnerInstitution {
            partner_name,
            degree_code,
        } => Value::String(
            catalog
                .teach_degree_to_partner_institution(&partner_name, &degree_code)
                .await?,
        ),
        LocateSchoolInCampus {
            school_name,
            campus_name,
        } => Value::String(
            catalog
                .locate_school_in_campus(&school_name, &campus_name)
                .await?,
        ),
        LocateFacultyInCampus {
            faculty_name,
            campus_name,
        } => Value::String(
            catalog
                .locate_faculty_in_campus(&faculty_name, &campus_name)
                .await?,
        ),
        LocatePartnerInstitutionInCampus {
            partner_name,
            campus_name,
        } => Value::String(
            catalog
                .locate_partner_institution_in_campus(&partner_name, &campus_name)
                .await?,
        ),
        TypeDegreeWithBranch {
            degree_code,
            branch_name,
        } => Value::String(
            catalog
                .type_degree_with_branch(&degree_code, &branch_name)
                .await?,
        ),
    };
    Ok(value)
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use unigraph_core::WideInt;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn parses_unit_and_struct_operations() {
        assert_eq!(
            Operation::from_json(r#"{"operation": "degrees"}"#).unwrap(),
            Operation::Degrees
        );
        assert_eq!(
            Operation::from_json(r#"{"operation": "partner_institutions"}"#).unwrap(),
            Operation::PartnerInstitutions
        );
        assert_eq!(
            Operation::from_json(
                r#"{"operation": "degreesByCampus", "args": {"campusName": "Centro"}}"#
            )
            .unwrap(),
            Operation::DegreesByCampus {
                campus_name: "Centro".into()
            }
        );
    }

    #[test]
    fn create_takes_the_entity_as_args() {
        let op = Operation::from_json(
            r#"{"operation": "createDegree",
                "args": {"code": "G1", "name": "Biology", "credits": "123456789012345", "applications": 40}}"#,
        )
        .unwrap();
        let Operation::CreateDegree(degree) = op else {
            panic!("expected createDegree");
        };
        assert_eq!(degree.credits, Some(WideInt(123_456_789_012_345)));
        assert_eq!(degree.applications, Some(WideInt(40)));
        assert_eq!(degree.mark_cut_off, None);
    }

    #[test]
    fn partner_institution_names_follow_the_api() {
        let op = Operation::from_json(
            r#"{"operation": "createPartner_institution", "args": {"name": "ETH"}}"#,
        )
        .unwrap();
        assert!(matches!(op, Operation::CreatePartnerInstitution(_)));
        assert!(op.is_mutation());

        let op = Operation::from_json(
            r#"{"operation": "deletePartnerInstitution", "args": {"name": "ETH"}}"#,
        )
        .unwrap();
        assert!(matches!(op, Operation::DeletePartnerInstitution { .. }));
    }

    #[test]
    fn malformed_input_is_a_validation_error() {
        for input in [
            r#"{"operation": "noSuchOperation"}"#,
            r#"{"operation": "getDegreeByCode", "args": {}}"#,
            r#"{"operation": "createFaculty", "args": {"name": "Science", "foundation": "19x"}}"#,
        ] {
            assert!(
                matches!(Operation::from_json(input), Err(GraphError::Validation(_))),
                "accepted {input}"
            );
        }
    }

    #[tokio::test]
    async fn dispatch_serializes_wide_ints_as_strings() {
        let catalog = Catalog::new(MemoryStore::new());
        let mut degree = Degree::new("G1", "Biology");
        degree.credits = Some(WideInt(240));
        dispatch(&catalog, Operation::CreateDegree(degree))
            .await
            .unwrap();

        let value = dispatch(
            &catalog,
            Operation::GetDegreeByCode {
                code: "G1".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(value["credits"], json!("240"));
        assert_eq!(value["offered_places"], Value::Null);
    }

    #[tokio::test]
    async fn dispatch_link_returns_confirmation() {
        let catalog = Catalog::new(MemoryStore::new());
        catalog
            .create_school(&School {
                name: "ETSI".into(),
                foundation: None,
                web: None,
            })
            .await
            .unwrap();
        catalog
            .create_campus(&Campus {
                name: "Centro".into(),
                city: Some("Madrid".into()),
            })
            .await
            .unwrap();

        let op = Operation::from_json(
            r#"{"operation": "locateSchoolInCampus", "args": {"schoolName": "ETSI", "campusName": "Centro"}}"#,
        )
        .unwrap();
        let value = dispatch(&catalog, op).await.unwrap();
        assert!(value.as_str().unwrap().contains("ETSI"));
        assert!(value.as_str().unwrap().contains("Centro"));
    }

    #[tokio::test]
    async fn dispatch_surfaces_not_found() {
        let catalog = Catalog::new(MemoryStore::new());
        let err = dispatch(
            &catalog,
            Operation::DeleteCampus {
                name: "Nowhere".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(catalog.store().open_sessions(), 0);
    }
}
