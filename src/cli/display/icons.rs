//! Status icons for CLI output

/// Icons for deployment outcomes
pub struct StatusIcon;

impl StatusIcon {
    /// Every requested unit was created
    pub const DEPLOYED: &'static str = "✓";

    /// Subordinate service, no units of its own
    pub const SUBORDINATE: &'static str = "↳";

    pub const FAILED: &'static str = "✗";

    /// Icon for a service given how many units exist out of those requested.
    pub fn for_units(created: usize, requested: usize, subordinate: bool) -> &'static str {
        if subordinate {
            Self::SUBORDINATE
        } else if requested > 0 && created == requested {
            Self::DEPLOYED
        } else {
            Self::FAILED
        }
    }

    pub fn status_text(created: usize, requested: usize, subordinate: bool) -> &'static str {
        if subordinate {
            "Subordinate"
        } else if requested > 0 && created == requested {
            "Deployed"
        } else {
            "Units failed"
        }
    }
}
