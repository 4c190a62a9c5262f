pub mod games_sea;
pub mod players_sea;
