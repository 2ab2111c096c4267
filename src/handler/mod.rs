pub mod department_handler;
pub mod ticket_handler;
