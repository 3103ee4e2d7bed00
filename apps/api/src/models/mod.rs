pub mod cv_record;
