#[cfg(test)]
mod tests {
    use crate::error::{validation, AppError, AppResult, OptionExt};
    use crate::naming::NamingError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;

    #[test]
    fn test_app_error_display() {
        let error = AppError::BadRequest("Invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: Invalid input");

        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(format!("{}", error), "Not found: Resource not found");

        let error = AppError::RateLimited { retry_after_seconds: 60 };
        assert_eq!(format!("{}", error), "Rate limited. Retry after 60 seconds");
    }

    #[test]
    fn test_app_error_into_response() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::RateLimited { retry_after_seconds: 30 }, StatusCode::TOO_MANY_REQUESTS),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::ValidationError { field: "url".into(), message: "bad".into() }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(v["error"]["details"]["field"], "url");
        assert_eq!(v["status"], 400);
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let app_error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(app_error, AppError::NotFound(_)));

        let app_error: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(app_error, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_from_sqlx_constraint_errors() {
        let pool = crate::tests::test_pool().await;
        sqlx::query("INSERT INTO users (username) VALUES ('dup')").execute(&pool).await.unwrap();

        let unique = sqlx::query("INSERT INTO users (username) VALUES ('dup')").execute(&pool).await.unwrap_err();
        assert!(matches!(AppError::from(unique), AppError::Conflict(_)));

        let fk = sqlx::query("INSERT INTO settings (owner) VALUES (999)").execute(&pool).await.unwrap_err();
        assert!(matches!(AppError::from(fk), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_database_error_prefixed_once() {
        let pool = crate::tests::test_pool().await;
        let err = sqlx::query("SELECT * FROM no_such_table").execute(&pool).await.unwrap_err();
        let app_error = AppError::from(err);
        assert!(matches!(app_error, AppError::Database(_)));
        let text = app_error.to_string();
        assert!(text.starts_with("Database error: "));
        assert!(text.contains("no_such_table"));
        assert_eq!(text.matches("Database error").count(), 1);

        let crashed = AppError::from(sqlx::Error::WorkerCrashed).to_string();
        assert_eq!(crashed.matches("Database error").count(), 1);
    }

    #[test]
    fn test_from_naming_error() {
        match AppError::from(NamingError::MissingExtension("README".into())) {
            AppError::ValidationError { field, message } => {
                assert_eq!(field, "filename");
                assert!(message.contains("README"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_option_ext() {
        let result: AppResult<i32> = Some(42).ok_or_not_found("tag");
        assert_eq!(result.unwrap(), 42);

        match None::<i32>.ok_or_not_found("tag 7").unwrap_err() {
            AppError::NotFound(msg) => assert_eq!(msg, "tag 7 not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_validate_required_text() {
        assert!(validation::validate_required_text("Work", "name", 32).is_ok());
        match validation::validate_required_text("   ", "name", 32).unwrap_err() {
            AppError::ValidationError { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, "name cannot be empty");
            }
            _ => panic!("Expected ValidationError"),
        }
        assert!(validation::validate_required_text(&"é".repeat(33), "name", 32).is_err());
        assert!(validation::validate_max_len("a\0b", "remark", 10).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validation::validate_username("alice.b+tag@x_y-z").is_ok());
        assert!(validation::validate_username("").is_err());
        assert!(validation::validate_username("has space").is_err());
        assert!(validation::validate_username("...").is_err());
        assert!(validation::validate_username(&"u".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validation::validate_url("https://www.rust-lang.org/learn").is_ok());
        assert!(validation::validate_url("http://localhost:8080").is_ok());
        assert!(validation::validate_url("ftp://example.org").is_err());
        assert!(validation::validate_url("example.org").is_err());
        assert!(validation::validate_url("").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validation::validate_positive_number(Some(1), "limit").is_ok());
        assert!(validation::validate_positive_number(None, "limit").is_ok());

        match validation::validate_positive_number(Some(-5), "limit").unwrap_err() {
            AppError::ValidationError { field, message } => {
                assert_eq!(field, "limit");
                assert!(message.contains("must be positive"));
                assert!(message.contains("-5"));
            }
            _ => panic!("Expected ValidationError"),
        }
    }
}
