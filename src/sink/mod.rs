pub mod solution_writer;
