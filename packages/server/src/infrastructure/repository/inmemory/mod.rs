//! インメモリ実装の Repository

mod room;

pub use room::InMemoryRoomRepository;
