//! Supplier verification types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use medsupply_core::{
    DocumentId, ProfileId, SupplierVerificationStatus, VerificationId, VerificationStatus,
};

/// A verification review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Verification {
    pub id: VerificationId,
    pub profile_id: ProfileId,
    pub status: VerificationStatus,
    /// Set only when `status` is `rejected`.
    pub reason: Option<String>,
    pub reviewed_by: Option<ProfileId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A file submitted with a verification.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VerificationDocument {
    pub id: DocumentId,
    pub verification_id: VerificationId,
    pub document_type: String,
    pub file_url: String,
    /// Object path inside the storage bucket.
    pub file_path: String,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

/// Supplier fields shown to admins reviewing a verification.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewSubject {
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub kra_pin: Option<String>,
    pub business_registration_number: Option<String>,
    pub business_address: Option<String>,
    pub supplier_status: Option<SupplierVerificationStatus>,
    pub supplier_rating: Option<Decimal>,
}

/// A verification as listed in the admin review queue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VerificationView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub verification: Verification,
    #[sqlx(flatten)]
    pub supplier: ReviewSubject,
    #[sqlx(skip)]
    pub documents: Vec<VerificationDocument>,
}

/// Admin decision on a verification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDecision {
    #[serde(alias = "verification_id")]
    pub verification_id: VerificationId,
    pub status: String,
    pub reason: Option<String>,
}

/// Document metadata attached to a resubmission.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    #[serde(alias = "documentType")]
    pub document_type: String,
    #[serde(alias = "fileUrl")]
    pub file_url: String,
    #[serde(alias = "filePath")]
    pub file_path: Option<String>,
}

/// Resubmission request from a supplier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResubmitRequest {
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

/// A supplier's own view of their latest review.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub verification_status: SupplierVerificationStatus,
    pub verification: Option<Verification>,
    pub documents: Vec<VerificationDocument>,
}
