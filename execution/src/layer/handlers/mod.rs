mod game;
mod settlement;
