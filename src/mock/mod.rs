//! Canned reference data served when the API cannot be reached on a read.
//!
//! Three bootcamps and three leads, cross-referenced by id. Every accessor
//! sleeps first to mimic network latency; list calls wait longer than
//! single-item calls.

use std::time::Duration;

use crate::config::FallbackConfig;
use crate::error::{ClientError, Result};
use crate::models::{Admin, Bootcamp, Lead, LeadStatus, Page, Pagination};

pub const DEMO_ACCESS_TOKEN: &str = "mock-access-token-12345";
pub const DEMO_REFRESH_TOKEN: &str = "mock-refresh-token-67890";

#[derive(Debug, Clone, Copy)]
pub struct MockDelays {
    pub bootcamp_list: Duration,
    pub lead_list: Duration,
    pub item: Duration,
}

impl MockDelays {
    pub fn from_config(config: &FallbackConfig) -> Self {
        Self {
            bootcamp_list: Duration::from_millis(config.bootcamp_list_delay_ms),
            lead_list: Duration::from_millis(config.lead_list_delay_ms),
            item: Duration::from_millis(config.item_delay_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            bootcamp_list: Duration::ZERO,
            lead_list: Duration::ZERO,
            item: Duration::ZERO,
        }
    }
}

impl Default for MockDelays {
    fn default() -> Self {
        Self::from_config(&FallbackConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    delays: MockDelays,
    bootcamps: Vec<Bootcamp>,
    leads: Vec<Lead>,
}

impl MockProvider {
    pub fn new(delays: MockDelays) -> Self {
        let bootcamps = fixture_bootcamps();
        let leads = fixture_leads(&bootcamps);
        Self {
            delays,
            bootcamps,
            leads,
        }
    }

    pub async fn bootcamps(&self) -> Vec<Bootcamp> {
        tokio::time::sleep(self.delays.bootcamp_list).await;
        self.bootcamps.clone()
    }

    pub async fn bootcamp(&self, id: &str) -> Result<Bootcamp> {
        tokio::time::sleep(self.delays.item).await;
        self.bootcamps
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Bootcamp non trouvé".to_string()))
    }

    pub async fn leads(&self, page: u32, limit: u32) -> Page<Lead> {
        tokio::time::sleep(self.delays.lead_list).await;
        let start = (page.max(1) as usize - 1).saturating_mul(limit as usize);
        let items = self
            .leads
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Page {
            items,
            pagination: Pagination::new(page, limit, self.leads.len() as u64),
        }
    }

    pub async fn lead(&self, id: &str) -> Result<Lead> {
        tokio::time::sleep(self.delays.item).await;
        self.leads
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Lead non trouvé".to_string()))
    }

    pub async fn profile(&self) -> Admin {
        tokio::time::sleep(self.delays.item).await;
        demo_admin()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(MockDelays::default())
    }
}

pub fn demo_admin() -> Admin {
    Admin {
        id: "1".to_string(),
        name: "Admin Xarala".to_string(),
        email: "admin@xarala.sn".to_string(),
        role: Some("admin".to_string()),
    }
}

const FIXTURE_CREATED_AT: &str = "2024-01-15T10:00:00.000Z";

fn bootcamp(id: &str, title: &str, description: &str, weeks: u32, price: u32, next: &str) -> Bootcamp {
    Bootcamp {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        duration: format!("{} semaines", weeks),
        price: price.to_string(),
        next_session: next.to_string(),
        is_active: true,
        created_at: FIXTURE_CREATED_AT.to_string(),
        updated_at: FIXTURE_CREATED_AT.to_string(),
        deleted_at: None,
    }
}

pub fn fixture_bootcamps() -> Vec<Bootcamp> {
    vec![
        bootcamp(
            "1",
            "Développement Web Full-Stack",
            "Apprenez à développer des applications web modernes avec les dernières technologies. \
             Formation intensive de 12 semaines couvrant HTML, CSS, JavaScript, React, Node.js et bases de données.",
            12,
            150000,
            "2024-03-01T00:00:00.000Z",
        ),
        bootcamp(
            "2",
            "Développement Mobile",
            "Formation complète en développement mobile avec React Native et Flutter. \
             Créez des applications mobiles performantes pour iOS et Android.",
            10,
            120000,
            "2024-04-01T00:00:00.000Z",
        ),
        bootcamp(
            "3",
            "Data Science & IA",
            "Découvrez les fondamentaux de la data science, du machine learning et de l'intelligence artificielle. \
             Python, pandas, scikit-learn et plus encore.",
            14,
            180000,
            "2024-05-01T00:00:00.000Z",
        ),
    ]
}

pub fn fixture_leads(bootcamps: &[Bootcamp]) -> Vec<Lead> {
    let lead = |id: &str,
                name: &str,
                email: &str,
                phone: &str,
                message: &str,
                status: LeadStatus,
                bootcamp_id: &str,
                at: &str| Lead {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        message: message.to_string(),
        status,
        bootcamp_id: bootcamp_id.to_string(),
        created_at: at.to_string(),
        updated_at: at.to_string(),
        bootcamp: bootcamps.iter().find(|b| b.id == bootcamp_id).cloned(),
    };

    vec![
        lead(
            "1",
            "Fatou Diop",
            "fatou.diop@email.com",
            "+221 77 123 45 67",
            "Je suis très intéressée par le bootcamp Full-Stack. Pouvez-vous me donner plus d'informations sur les prérequis ?",
            LeadStatus::Nouveau,
            "1",
            "2024-01-20T14:30:00.000Z",
        ),
        lead(
            "2",
            "Mamadou Diallo",
            "mamadou.diallo@email.com",
            "+221 76 987 65 43",
            "Bonjour, je voudrais m'inscrire au bootcamp Data Science. Y a-t-il des places disponibles ?",
            LeadStatus::Interesse,
            "3",
            "2024-01-19T09:15:00.000Z",
        ),
        lead(
            "3",
            "Aissatou Ba",
            "aissatou.ba@email.com",
            "+221 78 456 78 90",
            "Je souhaite développer des applications mobiles. Le bootcamp Mobile est-il adapté pour les débutants ?",
            LeadStatus::Contacte,
            "2",
            "2024-01-18T16:45:00.000Z",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_fixtures_cross_reference() {
        let bootcamps = fixture_bootcamps();
        let leads = fixture_leads(&bootcamps);
        assert_eq!(bootcamps.len(), 3);
        assert_eq!(leads.len(), 3);
        for lead in &leads {
            let embedded = lead.bootcamp.as_ref().expect("embedded bootcamp");
            assert_eq!(embedded.id, lead.bootcamp_id);
            assert!(bootcamps.iter().any(|b| b.id == lead.bootcamp_id));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_waits_longer_than_item() {
        let provider = MockProvider::default();

        let started = Instant::now();
        let bootcamps = provider.bootcamps().await;
        assert_eq!(bootcamps.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(1000));

        let started = Instant::now();
        provider.bootcamp("2").await.unwrap();
        let item = started.elapsed();
        assert!(item >= Duration::from_millis(500));
        assert!(item < Duration::from_millis(800));

        let started = Instant::now();
        provider.leads(1, 10).await;
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_lead_is_not_found() {
        let provider = MockProvider::default();
        match provider.lead("999").await {
            Err(ClientError::NotFound(msg)) => assert_eq!(msg, "Lead non trouvé"),
            other => panic!("expected not found, got {:?}", other),
        }
        assert!(matches!(
            provider.bootcamp("999").await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lead_pagination() {
        let provider = MockProvider::new(MockDelays::none());

        let page = provider.leads(1, 2).await;
        assert_eq!(
            page.items.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2"]
        );
        assert_eq!(page.pagination, Pagination::new(1, 2, 3));
        assert_eq!(page.pagination.total_pages, 2);

        let page = provider.leads(2, 2).await;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "3");

        let page = provider.leads(5, 2).await;
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total, 3);
    }
}
