use crate::types::Service;

/// Retired service slugs and the slug that replaced them.
pub const SLUG_REDIRECTS: &[(&str, &str)] = &[
    ("sports-massage", "sports-injury-rehabilitation"),
    ("sports-physio", "sports-injury-rehabilitation"),
    ("back-pain-treatment", "manual-therapy"),
    ("joint-mobilisation", "manual-therapy"),
    ("post-op-rehab", "post-surgical-rehabilitation"),
    ("acupuncture", "dry-needling"),
    ("womens-health", "pelvic-health"),
];

pub fn redirect_target(slug: &str) -> Option<&'static str> {
    SLUG_REDIRECTS
        .iter()
        .find(|(legacy, _)| *legacy == slug)
        .map(|(_, target)| *target)
}

/// Read-only list of treatments offered by the practice.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, slug: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.slug == slug)
    }

    /// Like `get`, but also accepts retired slugs.
    pub fn resolve(&self, slug: &str) -> Option<&Service> {
        self.get(slug)
            .or_else(|| redirect_target(slug).and_then(|target| self.get(target)))
    }
}

fn service(
    slug: &str,
    title: &str,
    description: &str,
    benefits: &[&str],
    process_steps: &[&str],
) -> Service {
    Service {
        slug: slug.into(),
        title: title.into(),
        description: description.into(),
        benefits: benefits.iter().map(|benefit| benefit.to_string()).collect(),
        process_steps: process_steps.iter().map(|step| step.to_string()).collect(),
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::new(vec![
            service(
                "sports-injury-rehabilitation",
                "Sports Injury Rehabilitation",
                "Structured recovery from strains, sprains and overuse injuries, with a plan to get you back to training safely.",
                &[
                    "Faster return to sport",
                    "Lower risk of re-injury",
                    "Sport-specific strength work",
                ],
                &[
                    "Injury assessment and movement screening",
                    "Pain and swelling management",
                    "Progressive loading programme",
                    "Return-to-sport testing",
                ],
            ),
            service(
                "manual-therapy",
                "Manual Therapy",
                "Hands-on joint mobilisation and soft tissue techniques for back, neck and joint pain.",
                &[
                    "Reduced pain and stiffness",
                    "Improved range of motion",
                    "Better posture",
                ],
                &[
                    "Postural and joint assessment",
                    "Mobilisation and soft tissue treatment",
                    "Home exercise plan",
                ],
            ),
            service(
                "post-surgical-rehabilitation",
                "Post-Surgical Rehabilitation",
                "Guided rehabilitation after joint replacement, ligament reconstruction and other orthopaedic surgery.",
                &[
                    "Restored strength and mobility",
                    "Protected healing",
                    "Coordination with your surgeon",
                ],
                &[
                    "Review of surgical notes",
                    "Early mobility and swelling control",
                    "Strength and balance training",
                    "Discharge planning",
                ],
            ),
            service(
                "dry-needling",
                "Dry Needling",
                "Fine filament needles to release muscular trigger points as part of a wider treatment plan.",
                &["Relief of muscle tension", "Reduced referred pain"],
                &[
                    "Trigger point assessment",
                    "Needling session",
                    "Follow-up stretching",
                ],
            ),
            service(
                "pelvic-health",
                "Pelvic Health Physiotherapy",
                "Assessment and treatment of pelvic floor dysfunction, including pre- and postnatal care.",
                &[
                    "Improved continence",
                    "Reduced pelvic pain",
                    "Confidence returning to exercise",
                ],
                &[
                    "Confidential consultation",
                    "Pelvic floor assessment",
                    "Individual exercise programme",
                ],
            ),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_every_redirect_points_to_a_known_service() {
        let catalog = ServiceCatalog::default();
        for (legacy, target) in SLUG_REDIRECTS {
            assert!(catalog.get(legacy).is_none(), "{legacy} is still a live slug");
            assert!(catalog.get(target).is_some(), "{target} is not in the catalog");
        }
    }

    #[test_case("manual-therapy", Some("manual-therapy") ; "canonical slug")]
    #[test_case("back-pain-treatment", Some("manual-therapy") ; "legacy slug")]
    #[test_case("acupuncture", Some("dry-needling") ; "other legacy slug")]
    #[test_case("yoga", None ; "unknown slug")]
    fn test_resolve(slug: &str, expected: Option<&str>) {
        let catalog = ServiceCatalog::default();
        assert_eq!(
            catalog.resolve(slug).map(|service| service.slug.as_str()),
            expected
        );
    }

    #[test]
    fn test_get_does_not_follow_redirects() {
        let catalog = ServiceCatalog::default();
        assert!(catalog.get("sports-massage").is_none());
        assert_eq!(redirect_target("sports-massage"), Some("sports-injury-rehabilitation"));
        assert_eq!(redirect_target("manual-therapy"), None);
    }

    #[test]
    fn test_slugs_are_unique() {
        let catalog = ServiceCatalog::default();
        let mut slugs: Vec<&str> = catalog
            .services()
            .iter()
            .map(|service| service.slug.as_str())
            .collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), catalog.services().len());
    }
}
