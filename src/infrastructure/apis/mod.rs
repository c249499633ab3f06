pub mod http_asset_store;
