pub mod entry;
pub mod raffle;
pub mod result;
pub mod ticket;
pub mod user;

pub use entry::{Applicant, Entry};
pub use raffle::{CreateRaffleRequest, NewRaffle, Raffle, RaffleRecord, RaffleState, RaffleView, Winner};
pub use result::RaffleResult;
pub use ticket::{Ticket, TicketStatus};
pub use user::User;
