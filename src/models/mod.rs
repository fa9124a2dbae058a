pub mod variable;
pub mod grid;
pub mod series;
pub mod forecast;
pub mod record;
