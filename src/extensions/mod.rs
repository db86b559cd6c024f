pub mod option;
