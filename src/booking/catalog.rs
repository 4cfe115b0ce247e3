//! Bookable services and their prices.

use crate::config::ServiceCfg;

/// Fixed list of services, in the order the user sees them.
#[derive(Clone, Debug)]
pub struct ServiceCatalog {
    items: Vec<ServiceCfg>,
}

impl ServiceCatalog {
    /// Build from config; an empty list falls back to the built-in services.
    pub fn from_config(items: &[ServiceCfg]) -> Self {
        if items.is_empty() {
            tracing::warn!("no services configured, using built-in catalog");
            return Self {
                items: ServiceCfg::defaults(),
            };
        }
        Self {
            items: items.to_vec(),
        }
    }

    pub fn items(&self) -> &[ServiceCfg] {
        &self.items
    }

    /// Default selection for a new draft.
    pub fn first(&self) -> &str {
        self.items.first().map(|s| s.name.as_str()).unwrap_or_default()
    }

    /// Estimated price in rupees; 0 for unknown services.
    pub fn price_of(&self, name: &str) -> u32 {
        self.items
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.price)
            .unwrap_or(0)
    }

    /// Services whose name contains `term`, ignoring case.
    pub fn filter(&self, term: &str) -> Vec<&ServiceCfg> {
        let term = term.to_lowercase();
        self.items
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&term))
            .collect()
    }

    /// Service after `current` within the filtered list (wraps).
    pub fn next_after(&self, current: &str, term: &str) -> Option<String> {
        self.step(current, term, 1)
    }

    /// Service before `current` within the filtered list (wraps).
    pub fn prev_before(&self, current: &str, term: &str) -> Option<String> {
        self.step(current, term, -1)
    }

    fn step(&self, current: &str, term: &str, delta: isize) -> Option<String> {
        let visible = self.filter(term);
        if visible.is_empty() {
            return None;
        }
        let len = visible.len() as isize;
        let idx = match visible.iter().position(|s| s.name == current) {
            Some(i) => (i as isize + delta).rem_euclid(len),
            // Current selection hidden by the filter: jump to the first match.
            None => 0,
        };
        Some(visible[idx as usize].name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::from_config(&ServiceCfg::defaults())
    }

    #[test]
    fn test_first_entry_and_prices() {
        let c = catalog();
        assert_eq!(c.first(), "Fan Repair");
        assert_eq!(c.price_of("AC Repair"), 1299);
        assert_eq!(c.price_of("Plumbing"), 0);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let c = catalog();
        let names: Vec<&str> = c.filter("REPAIR").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Fan Repair", "AC Repair", "Switch Repair"]);
        assert!(c.filter("plumbing").is_empty());
        assert_eq!(c.filter("").len(), 4);
    }

    #[test]
    fn test_cycling_stays_inside_filter() {
        let c = catalog();
        assert_eq!(c.next_after("Fan Repair", "").as_deref(), Some("AC Repair"));
        assert_eq!(
            c.next_after("Light Installation", "").as_deref(),
            Some("Fan Repair")
        );
        assert_eq!(
            c.prev_before("Fan Repair", "repair").as_deref(),
            Some("Switch Repair")
        );
        assert_eq!(
            c.next_after("Fan Repair", "light").as_deref(),
            Some("Light Installation")
        );
        assert_eq!(c.next_after("Fan Repair", "zzz"), None);
    }

    #[test]
    fn test_empty_config_uses_builtin_services() {
        let c = ServiceCatalog::from_config(&[]);
        assert_eq!(c.items().len(), 4);
    }
}
