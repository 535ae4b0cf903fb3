pub mod market_data;
pub mod mock_market;
