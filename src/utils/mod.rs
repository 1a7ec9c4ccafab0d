pub mod post_url;
