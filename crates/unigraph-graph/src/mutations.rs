//! Write operations: create, update, delete, and link.
//!
//! Nodes are always addressed by identity attribute. Relationships can be
//! created but never updated or removed; deleting a node detaches it.

use unigraph_core::{Branch, Campus, Degree, Faculty, LinkKind, PartnerInstitution, School};

use crate::catalog::{traced, Catalog};
use crate::error::Result;
use crate::store::GraphStore;

impl<S: GraphStore> Catalog<S> {
    // ── Degree ───────────────────────────────────────────────────

    /// Fails with `Conflict` when the code is already taken.
    pub async fn create_degree(&self, degree: &Degree) -> Result<Degree> {
        traced("createDegree", self.create(degree)).await
    }

    pub async fn update_degree(&self, degree: &Degree) -> Result<Degree> {
        traced("updateDegree", self.update(degree)).await
    }

    pub async fn delete_degree(&self, code: &str) -> Result<String> {
        traced("deleteDegree", self.delete::<Degree>(code)).await
    }

    // ── Campus ───────────────────────────────────────────────────

    pub async fn create_campus(&self, campus: &Campus) -> Result<Campus> {
        traced("createCampus", self.create(campus)).await
    }

    pub async fn update_campus(&self, campus: &Campus) -> Result<Campus> {
        traced("updateCampus", self.update(campus)).await
    }

    pub async fn delete_campus(&self, name: &str) -> Result<String> {
        traced("deleteCampus", self.delete::<Campus>(name)).await
    }

    // ── Branch ───────────────────────────────────────────────────

    pub async fn create_branch(&self, branch: &Branch) -> Result<Branch> {
        traced("createBranch", self.create(branch)).await
    }

    /// A Branch has no attribute besides its name; this only confirms it exists.
    pub async fn update_branch(&self, branch: &Branch) -> Result<Branch> {
        traced("updateBranch", self.update(branch)).await
    }

    pub async fn delete_branch(&self, name: &str) -> Result<String> {
        traced("deleteBranch", self.delete::<Branch>(name)).await
    }

    // ── Faculty ──────────────────────────────────────────────────

    pub async fn create_faculty(&self, faculty: &Faculty) -> Result<Faculty> {
        traced("createFaculty", self.create(faculty)).await
    }

    pub async fn update_faculty(&self, faculty: &Faculty) -> Result<Faculty> {
        traced("updateFaculty", self.update(faculty)).await
    }

    pub async fn delete_faculty(&self, name: &str) -> Result<String> {
        traced("deleteFaculty", self.delete::<Faculty>(name)).await
    }

    // ── Partner Institution ──────────────────────────────────────

    pub async fn create_partner_institution(
        &self,
        partner: &PartnerInstitution,
    ) -> Result<PartnerInstitution> {
        traced("createPartner_institution", self.create(partner)).await
    }

    pub async fn update_partner_institution(
        &self,
        partner: &PartnerInstitution,
    ) -> Result<PartnerInstitution> {
        traced("updatePartnerInstitution", self.update(partner)).await
    }

    pub async fn delete_partner_institution(&self, name: &str) -> Result<String> {
        traced(
            "deletePartnerInstitution",
            self.delete::<PartnerInstitution>(name),
        )
        .await
    }

    // ── School ───────────────────────────────────────────────────

    pub async fn create_school(&self, school: &School) -> Result<School> {
        traced("createSchool", self.create(school)).await
    }

    pub async fn update_school(&self, school: &School) -> Result<School> {
        traced("updateSchool", self.update(school)).await
    }

    pub async fn delete_school(&self, name: &str) -> Result<String> {
        traced("deleteSchool", self.delete::<School>(name)).await
    }

    // ── Links ────────────────────────────────────────────────────

    pub async fn teach_degree_to_school(&self, school: &str, degree_code: &str) -> Result<String> {
        traced(
            "teachDegreeToSchool",
            self.link(LinkKind::SchoolTeachesDegree, school, degree_code),
        )
        .await
    }

    pub async fn teach_degree_to_faculty(
        &self,
        faculty: &str,
        degree_code: &str,
    ) -> Result<String> {
        traced(
            "teachDegreeToFaculty",
            self.link(LinkKind::FacultyTeachesDegree, faculty, degree_code),
        )
        .await
    }

    pub async fn teach_degree_to_partner_institution(
        &self,
        partner: &str,
        degree_code: &str,
    ) -> Result<String> {
        traced(
            "teachDegreeToPartnerInstitution",
            self.link(LinkKind::PartnerTeachesDegree, partner, degree_code),
        )
        .await
    }

    pub async fn locate_school_in_campus(&self, school: &str, campus: &str) -> Result<String> {
        traced(
            "locateSchoolInCampus",
            self.link(LinkKind::SchoolLocatedInCampus, school, campus),
        )
        .await
    }

    pub async fn locate_faculty_in_campus(&self, faculty: &str, campus: &str) -> Result<String> {
        traced(
            "locateFacultyInCampus",
            self.link(LinkKind::FacultyLocatedInCampus, faculty, campus),
        )
        .await
    }

    pub async fn locate_partner_institution_in_campus(
        &self,
        partner: &str,
        campus: &str,
    ) -> Result<String> {
        traced(
            "locatePartnerInstitutionInCampus",
            self.link(LinkKind::PartnerLocatedInCampus, partner, campus),
        )
        .await
    }

    pub async fn type_degree_with_branch(&self, degree_code: &str, branch: &str) -> Result<String> {
        traced(
            "typeDegreeWithBranch",
            self.link(LinkKind::DegreeTypeBranch, degree_code, branch),
        )
        .await
    }
}
