mod fakes;
mod state;
