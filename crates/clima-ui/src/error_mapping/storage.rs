use clima_core::AppError;
use clima_services::StorageError;

use super::IntoAppError;

impl IntoAppError for StorageError {
    fn into_app_error(self) -> AppError {
        AppError::storage(self.to_string())
    }
}
