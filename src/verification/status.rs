pub const VERIFILY_STATUS_HEADER: &str = "X-Verifily-Status";
pub const VERIFILY_STATUS_HEALTHY: &str = "healthy";
pub const VERIFILY_STATUS_READY: &str = "ready";
pub const VERIFILY_STATUS_NOT_READY: &str = "not_ready";
pub const VERIFILY_STATUS_ERROR: &str = "error";

/// How a verdict was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifilyStatus {
    /// Scored by the ensemble on this request.
    Miss,
    /// Served from the verification store.
    Hit,
    /// Set by the content's author.
    Override,
}

impl VerifilyStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            VerifilyStatus::Miss => "MISS",
            VerifilyStatus::Hit => "HIT",
            VerifilyStatus::Override => "OVERRIDE",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, VerifilyStatus::Hit)
    }

    pub fn from_cached(cached: bool) -> Self {
        if cached {
            VerifilyStatus::Hit
        } else {
            VerifilyStatus::Miss
        }
    }
}

impl std::fmt::Display for VerifilyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}
