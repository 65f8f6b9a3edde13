pub mod user;
pub mod actor;
pub mod genre;
pub mod play;
pub mod theater_hall;
pub mod performance;
pub mod reservation;
pub mod ticket;

pub use user::User;
pub use actor::Actor;
pub use genre::Genre;
pub use play::Play;
pub use theater_hall::TheaterHall;
pub use performance::Performance;
pub use reservation::Reservation;
pub use ticket::Ticket;
