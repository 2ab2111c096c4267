pub mod departmentmodel;
pub mod ticketmodel;
pub mod usermodel;
