use careconnect_core::{ServiceAvailability, ServiceCategory, ServiceRecord};

pub fn fixture_services() -> Vec<ServiceRecord> {
    vec![
        service(
            "1",
            "City Food Bank",
            ServiceCategory::Food,
            "123 Main Street, Downtown",
            2.3,
            ServiceAvailability::Available,
            "(555) 123-4567",
            "info@cityfoodbank.org",
        ),
        service(
            "2",
            "Hope Shelter",
            ServiceCategory::Shelter,
            "456 Oak Avenue, Riverside",
            3.8,
            ServiceAvailability::Available,
            "(555) 234-5678",
            "help@hopeshelter.org",
        ),
        service(
            "3",
            "Community Health Center",
            ServiceCategory::Medical,
            "789 Health Plaza, Midtown",
            1.5,
            ServiceAvailability::Limited,
            "(555) 345-6789",
            "services@commhealth.org",
        ),
        service(
            "4",
            "Mental Wellness Hub",
            ServiceCategory::MentalHealth,
            "321 Peace Lane, Westside",
            4.2,
            ServiceAvailability::Available,
            "(555) 456-7890",
            "support@mentalwellness.org",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn service(
    id: &str,
    name: &str,
    category: ServiceCategory,
    address: &str,
    distance_km: f64,
    availability: ServiceAvailability,
    phone: &str,
    email: &str,
) -> ServiceRecord {
    ServiceRecord {
        id: id.to_string(),
        name: name.to_string(),
        category,
        distance_km,
        availability,
        address: address.to_string(),
        phone: Some(phone.to_string()),
        email: Some(email.to_string()),
        description: None,
    }
}
