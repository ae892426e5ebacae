use serde::{Deserialize, Serialize};

/// A bookable therapy offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    /// Display duration, e.g. "60 Min."
    pub duration: String,
    /// Base price in whole currency units
    pub price: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Price and duration depend on whether this is the client's first session
    #[serde(default)]
    pub session_dependent_pricing: bool,
}

/// Read-only list of services offered by the practice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// The practice's built-in offerings.
    pub fn builtin() -> Self {
        Self::new(vec![
            Service {
                id: "reflex".to_string(),
                title: "Fussreflexzonen-Therapie".to_string(),
                duration: "60 – 75 Min.".to_string(),
                price: 120,
                price_range: Some("120 – 150".to_string()),
                description: "Aktivierung der Selbstheilungskräfte durch gezielte Druckmassage an den Füssen.".to_string(),
                long_description: Some(
                    "Die Fussreflexzonen-Therapie basiert auf der Vorstellung, dass der Fuss ein verkleinertes \
                     Abbild des gesamten Menschen ist. Durch gezielte Druckimpulse am Fuss können korrespondierende \
                     Körperbereiche und Organe stimuliert und harmonisiert werden.\n\nDie Erstbehandlung beinhaltet \
                     eine ausführliche Anamnese und dauert ca. 75 Minuten. Folgebehandlungen dienen der gezielten \
                     Therapie und dauern in der Regel 60 Minuten."
                        .to_string(),
                ),
                images: vec![
                    "https://images.unsplash.com/photo-1519415387722-a1c3bbef716c?q=80&w=1200&auto=format&fit=crop".to_string(),
                    "https://images.unsplash.com/photo-1544161515-4ab6ce6db874?q=80&w=1200&auto=format&fit=crop".to_string(),
                    "https://images.unsplash.com/photo-1600334089648-b0d9d3028eb2?q=80&w=1200&auto=format&fit=crop".to_string(),
                ],
                session_dependent_pricing: true,
            },
            Service {
                id: "neuro".to_string(),
                title: "Neurosomatische Körperarbeit".to_string(),
                duration: "60 Min.".to_string(),
                price: 120,
                price_range: None,
                description: "Tiefenentspannung und Neuausrichtung des Nervensystems durch sanfte Impulse.".to_string(),
                long_description: Some(
                    "Die Neurosomatische Integration® ist eine sanfte, aber tiefgreifende Methode zur Regulation \
                     des Nervensystems. Durch achtsame Berührung und gezielte Impulse wird dem Körper geholfen, \
                     Stressmuster loszulassen und in einen Zustand der Sicherheit und Entspannung zurückzufinden. \
                     Besonders geeignet bei chronischen Schmerzen, Erschöpfung und innerer Unruhe."
                        .to_string(),
                ),
                images: vec![
                    "https://images.unsplash.com/photo-1598901963450-813d66667971?q=80&w=1200&auto=format&fit=crop".to_string(),
                    "https://images.unsplash.com/photo-1579126038374-6064e9370f0f?q=80&w=1200&auto=format&fit=crop".to_string(),
                    "https://images.unsplash.com/photo-1515377905703-c4788e51af15?q=80&w=1200&auto=format&fit=crop".to_string(),
                ],
                session_dependent_pricing: false,
            },
        ])
    }

    pub fn find(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }
}
