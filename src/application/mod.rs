pub mod audition;
