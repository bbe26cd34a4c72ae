//! OS2mo `/service` REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::models::{
    Address, EmployeeSummary, Engagement, ItAccount, ManagerFunction, OrgUnitDetail,
    OrgUnitSummary, Organisation, Page,
};
use super::OrgSource;
use crate::config::{HttpConfig, Os2moConfig};
use crate::errors::SourceError;

/// Header OS2mo reads the API token from.
const SESSION_HEADER: &str = "SESSION";

/// Asynchronous OS2mo API client.
pub struct MoClient {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
    organisation: OnceCell<String>,
}

impl MoClient {
    pub fn new(config: &Os2moConfig, http_config: &HttpConfig) -> Result<Self, SourceError> {
        let base_url = config.url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("os2rollekatalog-sync/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = config.api_key.as_deref() {
            let mut value = HeaderValue::from_str(token)
                .map_err(|_| SourceError::InvalidToken(SESSION_HEADER.into()))?;
            value.set_sensitive(true);
            headers.insert(SESSION_HEADER, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = http_config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        let organisation = OnceCell::new();
        if let Some(uuid) = &config.organisation_uuid {
            let _ = organisation.set(uuid.clone());
        }

        info!(base_url = %base_url, "created MoClient");
        Ok(Self {
            http,
            base_url,
            page_size: config.page_size.max(1),
            organisation,
        })
    }

    /// The organisation uuid, discovered on first use unless configured.
    async fn organisation(&self) -> Result<&str, SourceError> {
        let uuid = self
            .organisation
            .get_or_try_init(|| async {
                let orgs: Vec<Organisation> = self.get_json("/service/o/").await?;
                let org = orgs.into_iter().next().ok_or(SourceError::NoOrganisation)?;
                info!(organisation = %org.uuid, "discovered OS2mo organisation");
                Ok::<_, SourceError>(org.uuid)
            })
            .await?;
        Ok(uuid.as_str())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        let resp = self.http.get(&url).send().await?;
        let resp = check_response(resp).await?;
        Ok(resp.json().await?)
    }

    /// Walk a `{items, offset, total}` listing page by page.
    async fn get_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let mut items: Vec<T> = Vec::new();
        loop {
            let start = items.len().to_string();
            let limit = self.page_size.to_string();
            debug!(url = %url, start = %start, limit = %limit, "GET page");
            let resp = self
                .http
                .get(&url)
                .query(&[("start", start.as_str()), ("limit", limit.as_str())])
                .send()
                .await?;
            let page: Page<T> = check_response(resp).await?.json().await?;

            let received = page.items.len();
            items.extend(page.items);
            let done = match page.total {
                Some(total) => items.len() >= total,
                None => received < self.page_size,
            };
            if received == 0 || done {
                break;
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl OrgSource for MoClient {
    #[instrument(skip(self))]
    async fn list_org_units(&self) -> Result<Vec<OrgUnitSummary>, SourceError> {
        let org = self.organisation().await?.to_string();
        let units: Vec<OrgUnitSummary> = self.get_paged(&format!("/service/o/{}/ou/", org)).await?;
        debug!(count = units.len(), "fetched org units");
        Ok(units)
    }

    #[instrument(skip(self))]
    async fn get_org_unit(&self, uuid: &str) -> Result<OrgUnitDetail, SourceError> {
        match self.get_json(&format!("/service/ou/{}/", uuid)).await {
            Err(SourceError::ApiError { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(SourceError::NotFound {
                    entity: "org unit".into(),
                    uuid: uuid.to_string(),
                })
            }
            other => other,
        }
    }

    #[instrument(skip(self))]
    async fn get_org_unit_managers(
        &self,
        uuid: &str,
    ) -> Result<Vec<ManagerFunction>, SourceError> {
        self.get_json(&format!("/service/ou/{}/details/manager", uuid))
            .await
    }

    #[instrument(skip(self))]
    async fn get_org_unit_engagements(&self, uuid: &str) -> Result<Vec<Engagement>, SourceError> {
        self.get_json(&format!("/service/ou/{}/details/engagement", uuid))
            .await
    }

    #[instrument(skip(self))]
    async fn get_org_unit_children(&self, uuid: &str) -> Result<Vec<OrgUnitSummary>, SourceError> {
        self.get_json(&format!("/service/ou/{}/children", uuid)).await
    }

    #[instrument(skip(self))]
    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, SourceError> {
        let org = self.organisation().await?.to_string();
        let employees: Vec<EmployeeSummary> =
            self.get_paged(&format!("/service/o/{}/e/", org)).await?;
        debug!(count = employees.len(), "fetched employees");
        Ok(employees)
    }

    #[instrument(skip(self))]
    async fn get_employee_it(&self, uuid: &str) -> Result<Vec<ItAccount>, SourceError> {
        self.get_json(&format!("/service/e/{}/details/it", uuid)).await
    }

    #[instrument(skip(self))]
    async fn get_employee_addresses(&self, uuid: &str) -> Result<Vec<Address>, SourceError> {
        self.get_json(&format!("/service/e/{}/details/address", uuid))
            .await
    }

    #[instrument(skip(self))]
    async fn get_employee_engagements(&self, uuid: &str) -> Result<Vec<Engagement>, SourceError> {
        self.get_json(&format!("/service/e/{}/details/engagement", uuid))
            .await
    }
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = match resp.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(url = %url, error = %e, "failed to read OS2mo error body");
            String::new()
        }
    };
    Err(SourceError::ApiError {
        status: status.as_u16(),
        url,
        body,
    })
}
