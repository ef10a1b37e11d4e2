pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod state;

pub mod crypto {
    pub mod digest_codec;
    pub mod hmac_codec;
    pub mod secret;
    pub mod token;
}

pub mod models {
    pub mod user;
}

pub mod repositories {
    pub mod user;
}

pub mod services {
    pub mod auth;
}

pub mod handlers {
    pub mod auth;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod gateway;
}

pub mod validation {
    pub mod auth;
}
