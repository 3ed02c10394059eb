pub mod db_utils;
pub mod error;
pub mod json_column;
pub mod patch;
