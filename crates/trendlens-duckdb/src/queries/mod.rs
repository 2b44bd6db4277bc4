pub mod daily_rows;
