pub mod bar_queries;
