pub mod departmentdtos;
pub mod ticketdtos;
