use serde::{Deserialize, Serialize};

/// Election status and branding, as needed by the login screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionInfo {
    pub open: bool,
    pub school_year: String,
    pub school_name: String,
    pub logo_url: String,
}

/// Branding update; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrandingUpdate {
    pub school_name: Option<String>,
    pub logo_url: Option<String>,
}

/// School-year label update.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchoolYearUpdate {
    pub school_year: String,
}
