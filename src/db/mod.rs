pub mod db;
pub mod departmentdb;
pub mod ticketdb;
pub mod userdb;
