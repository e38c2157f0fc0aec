use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use balcao_engine::PaymentPipelineError;
use mpago_tools::MpagoApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The request conflicts with the order's current state. {0}")]
    Conflict(String),
    #[error("The payment gateway rejected or dropped the request. {0}")]
    PaymentGatewayError(#[from] MpagoApiError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentPipelineError> for ServerError {
    fn from(e: PaymentPipelineError) -> Self {
        use PaymentPipelineError::*;
        match &e {
            InvalidInput(_) | MenuItemNotFound(_) | MenuItemUnavailable(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            PermissionDenied(_) => Self::InsufficientPermissions(e.to_string()),
            OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderAlreadyExists(_) | UniqueViolation(_) | AmendmentNotAllowed { .. } | InvalidStatusChange { .. } |
            PaymentArtifactOutstanding(_) | PaymentNotPending(_) => Self::Conflict(e.to_string()),
            DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use balcao_engine::db_types::{OrderId, OrderStatusType};

    use super::*;

    fn status_for(e: PaymentPipelineError) -> StatusCode {
        ServerError::from(e).status_code()
    }

    #[test]
    fn pipeline_errors_map_to_the_right_status_codes() {
        let id = OrderId("ord-1".to_string());
        assert_eq!(status_for(PaymentPipelineError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(PaymentPipelineError::MenuItemNotFound(7)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(PaymentPipelineError::MenuItemUnavailable("Feijoada".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(PaymentPipelineError::PermissionDenied("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(PaymentPipelineError::OrderNotFound(id.clone())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(PaymentPipelineError::OrderAlreadyExists(id.clone())), StatusCode::CONFLICT);
        assert_eq!(
            status_for(PaymentPipelineError::AmendmentNotAllowed {
                order_id: id.clone(),
                status: OrderStatusType::Ready
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(PaymentPipelineError::InvalidStatusChange {
                from: OrderStatusType::Completed,
                to: OrderStatusType::Ready
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(PaymentPipelineError::PaymentArtifactOutstanding(id.clone())), StatusCode::CONFLICT);
        assert_eq!(status_for(PaymentPipelineError::PaymentNotPending(id)), StatusCode::CONFLICT);
        assert_eq!(status_for(PaymentPipelineError::DatabaseError("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn gateway_errors_are_bad_gateway() {
        let e = ServerError::from(MpagoApiError::QueryError { status: 500, message: "boom".into() });
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
    }
}
