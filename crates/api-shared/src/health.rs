use crate::dto::HealthRes;

/// Liveness check shared by every transport.
#[derive(Clone, Copy, Debug)]
pub struct HealthService;

impl HealthService {
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "VetHere is alive".into(),
        }
    }
}
