pub mod in_market;
