//! Vehicle submission and listing.

use tracing::{info, instrument};

use super::error::ServiceError;
use crate::storage::{Database, DatabaseError, NewVehicle, Vehicle};

pub const VIN_LEN: usize = 17;

/// Fields supplied when submitting a vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSubmission {
    pub vin: String,
    pub model_name: String,
    pub production_year: i64,
    pub plate_number: Option<String>,
    pub color: Option<String>,
}

pub struct VehicleService {
    db: Database,
}

impl VehicleService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Submit a vehicle for the caller. The case starts as `Submitted`.
    #[instrument(skip(self, submission), fields(op = "create_vehicle"))]
    pub async fn create_vehicle(
        &self,
        user_id: &str,
        submission: &VehicleSubmission,
    ) -> Result<Vehicle, ServiceError> {
        let vin = submission.vin.trim();
        if vin.chars().count() != VIN_LEN {
            return Err(ServiceError::validation(format!(
                "VIN must be {VIN_LEN} characters"
            )));
        }
        let model_name = submission.model_name.trim();
        if model_name.is_empty() {
            return Err(ServiceError::validation("Model name is required"));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let vehicle = self
            .db
            .create_vehicle(&NewVehicle {
                id: &id,
                user_id,
                vin,
                model_name,
                production_year: submission.production_year,
                plate_number: non_blank(submission.plate_number.as_deref()),
                color: non_blank(submission.color.as_deref()),
            })
            .await?;

        info!(user_id = %user_id, vehicle_id = %vehicle.id, "Vehicle submitted");
        Ok(vehicle)
    }

    /// The caller's vehicles, newest first.
    pub async fn list_vehicles(&self, user_id: &str) -> Result<Vec<Vehicle>, ServiceError> {
        Ok(self.db.list_vehicles(user_id).await?)
    }
}

/// Look up a vehicle the caller owns. Absent and foreign vehicles are both
/// `None` so a caller cannot tell another user's case from a missing one.
pub(crate) async fn owned_vehicle(
    db: &Database,
    vehicle_id: &str,
    user_id: &str,
) -> Result<Option<Vehicle>, ServiceError> {
    match db.get_vehicle(vehicle_id).await {
        Ok(vehicle) if vehicle.user_id == user_id => Ok(Some(vehicle)),
        Ok(_) | Err(DatabaseError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
