pub mod advisor;
pub mod domain;
pub mod llm;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub company_data_path: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: std::env::var("GEMINI_API_KEY")
                    .or_else(|_| std::env::var("API_KEY"))
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                company_data_path: std::env::var("COMPANY_DATA_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY (or API_KEY) is required")
        }

        /// Seed data unless a snapshot file is configured.
        pub fn load_company(&self) -> anyhow::Result<crate::domain::company::CompanySnapshot> {
            match self.company_data_path.as_deref() {
                Some(path) => crate::domain::company::CompanySnapshot::from_json_file(path),
                None => Ok(crate::domain::company::CompanySnapshot::seed()),
            }
        }
    }
}
