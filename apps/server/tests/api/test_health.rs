//! Health and readiness probes.

use super::test_helpers::*;

#[actix_rt::test]
async fn test_health_and_ready() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, test_config()).await;

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get_json(&app, "/api/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
}
