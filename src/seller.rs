//! Seller lead form. Homeowners ask for a market analysis or a listing
//! appointment; each request is one row in `seller_requests`.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::tables;
use crate::error::SellerRequestError;

/// Shown once a request is stored.
pub const THANK_YOU: &str = "We've received your request. A member of our team will contact you \
                             within 24 hours to discuss your home selling needs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Comparative market analysis.
    #[default]
    Cma,
    Appointment,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cma => "cma",
            Self::Appointment => "appointment",
        }
    }
}

impl FromStr for RequestType {
    type Err = SellerRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cma" => Ok(Self::Cma),
            "appointment" => Ok(Self::Appointment),
            other => Err(SellerRequestError::InvalidRequestType(other.to_string())),
        }
    }
}

/// The form as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SellerRequestForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub request_type: String,
    pub message: String,
}

impl Default for SellerRequestForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            request_type: RequestType::Cma.as_str().to_string(),
            message: String::new(),
        }
    }
}

/// A checked request, ready to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub property_address: String,
    pub request_type: RequestType,
    pub message: String,
}

impl SellerRequestForm {
    /// Name, email, phone and address are required; the message is not.
    pub fn validate(&self) -> Result<SellerRequest, SellerRequestError> {
        let required = |field: &'static str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(SellerRequestError::MissingField(field))
            } else {
                Ok(value.to_string())
            }
        };
        Ok(SellerRequest {
            name: required("name", &self.name)?,
            email: required("email", &self.email)?,
            phone: required("phone", &self.phone)?,
            property_address: required("address", &self.address)?,
            request_type: self.request_type.trim().parse()?,
            message: self.message.trim().to_string(),
        })
    }
}

impl SellerRequest {
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "property_address": self.property_address,
            "request_type": self.request_type,
            "message": self.message,
        })
    }
}

/// Validate and store one request. A failed write is logged and reported
/// with a retry notice; nothing is retried automatically.
pub async fn submit(
    backend: &Arc<dyn Backend>,
    form: &SellerRequestForm,
) -> Result<SellerRequest, SellerRequestError> {
    let request = form.validate()?;
    if let Err(e) = backend
        .insert_one(tables::SELLER_REQUESTS, &request.to_value())
        .await
    {
        warn!(request_type = request.request_type.as_str(), "Error submitting seller request: {}", e);
        return Err(SellerRequestError::SubmitFailed(e));
    }
    info!(request_type = request.request_type.as_str(), "Seller request received");
    Ok(request)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use tokio::sync::broadcast;

    use super::*;
    use crate::backend::{Filter, Select, Session, SessionEvent};
    use crate::error::{AuthError, BackendError};

    /// Accepts inserts unless `offline`.
    #[derive(Default)]
    struct InboxBackend {
        rows: Mutex<Vec<(String, Value)>>,
        offline: bool,
    }

    #[async_trait]
    impl Backend for InboxBackend {
        async fn get_session(&self) -> Result<Option<Session>, BackendError> {
            Ok(None)
        }
        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            broadcast::channel(1).1
        }
        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &SecretString,
        ) -> Result<Session, AuthError> {
            Err(AuthError::InvalidCredentials)
        }
        async fn sign_out(&self) -> Result<(), BackendError> {
            Ok(())
        }
        async fn read_one(&self, _table: &str, _id: &str) -> Result<Option<Value>, BackendError> {
            Ok(None)
        }
        async fn select(&self, _query: &Select) -> Result<Vec<Value>, BackendError> {
            Ok(vec![])
        }
        async fn count(&self, _table: &str, _filters: &[Filter]) -> Result<u64, BackendError> {
            Ok(0)
        }
        async fn insert_one(&self, table: &str, record: &Value) -> Result<(), BackendError> {
            if self.offline {
                return Err(BackendError::Status {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            self.rows.lock().unwrap().push((table.to_string(), record.clone()));
            Ok(())
        }
        async fn update(&self, _table: &str, _id: &str, _patch: &Value) -> Result<(), BackendError> {
            Ok(())
        }
        async fn delete(&self, _table: &str, _id: &str) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn form() -> SellerRequestForm {
        SellerRequestForm {
            name: " Dana Whitfield ".into(),
            email: "dana@example.com".into(),
            phone: "910-555-0117".into(),
            address: "12 Marsh Hen Dr, Wilmington".into(),
            ..Default::default()
        }
    }

    #[test]
    fn each_contact_field_is_required() {
        let cases: [(&str, fn(&mut SellerRequestForm)); 4] = [
            ("name", |f| f.name.clear()),
            ("email", |f| f.email = "  ".into()),
            ("phone", |f| f.phone.clear()),
            ("address", |f| f.address.clear()),
        ];
        for (field, blank) in cases {
            let mut f = form();
            blank(&mut f);
            assert!(
                matches!(f.validate(), Err(SellerRequestError::MissingField(m)) if m == field),
                "{field}"
            );
        }
        assert!(form().validate().is_ok());
    }

    #[test]
    fn request_type_defaults_to_cma() {
        let f: SellerRequestForm = serde_json::from_value(json!({
            "name": "Dana",
            "email": "dana@example.com",
            "phone": "555",
            "address": "12 Marsh Hen Dr"
        }))
        .unwrap();
        assert_eq!(f.validate().unwrap().request_type, RequestType::Cma);

        let bad = SellerRequestForm {
            request_type: "auction".into(),
            ..form()
        };
        assert!(matches!(
            bad.validate(),
            Err(SellerRequestError::InvalidRequestType(t)) if t == "auction"
        ));
    }

    #[tokio::test]
    async fn stores_one_row_with_column_names() {
        let inbox = Arc::new(InboxBackend::default());
        let backend: Arc<dyn Backend> = inbox.clone();
        let request = submit(
            &backend,
            &SellerRequestForm {
                request_type: "appointment".into(),
                message: "Flexible on dates".into(),
                ..form()
            },
        )
        .await
        .unwrap();
        assert_eq!(request.name, "Dana Whitfield");

        let rows = inbox.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "seller_requests");
        assert_eq!(rows[0].1["property_address"], "12 Marsh Hen Dr, Wilmington");
        assert_eq!(rows[0].1["request_type"], "appointment");
        assert_eq!(rows[0].1["message"], "Flexible on dates");
    }

    #[tokio::test]
    async fn failed_write_reports_retry_notice() {
        let backend: Arc<dyn Backend> = Arc::new(InboxBackend {
            offline: true,
            ..Default::default()
        });
        let err = submit(&backend, &form()).await.unwrap_err();
        assert!(matches!(err, SellerRequestError::SubmitFailed(_)));
        assert!(err.to_string().contains("Please try again"));
    }

    #[tokio::test]
    async fn invalid_form_writes_nothing() {
        let inbox = Arc::new(InboxBackend::default());
        let backend: Arc<dyn Backend> = inbox.clone();
        let f = SellerRequestForm {
            phone: String::new(),
            ..form()
        };
        assert!(submit(&backend, &f).await.is_err());
        assert!(inbox.rows.lock().unwrap().is_empty());
    }
}
