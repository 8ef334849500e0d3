//! The `http` block: logging, cache zones and shared defaults.

use crate::config::schema::NginxConfig;
use crate::rules::fragments::{AUTH_REQUESTS_CACHE, SITE_CONTENT_CACHE};
use crate::rules::tree::{Block, Directive, Node};

const MAIN_FORMAT: &str = "main '$time_local | $status | $request_time (s)| $remote_addr | $request'";

const AUTH_SERVICE_FORMAT: &str =
    "auth_service_format '$msec $remote_addr $request_method $host $request $http_user_agent'";

const LOGSTASH_FORMAT: &str = "logstash_format '$remote_addr $remote_user [$time_local] \"$request\" $scheme $host \
$status $bytes_sent \"$http_user_agent\" $upstream_cache_status \"$sent_http_content_type\" \
$proxy_host $request_time $scheme://$proxy_host:$proxy_port$uri \"$http_referer\" \"$http_x_forwarded_for\"'";

// Field names are prefixed so they do not collide in the log index.
const JSON_FORMAT: &str = r#"json_combined escape=json
        '{'
            '"time_local":"$time_local",'
            '"remote_addr":"$remote_addr",'
            '"request_host":"$host",'
            '"request_uri":"$request_uri",'
            '"ngx_status": "$status",'
            '"ngx_body_bytes_sent": "$body_bytes_sent",'
            '"ngx_upstream_addr": "$upstream_addr",'
            '"ngx_upstream_cache_status": "$upstream_cache_status",'
            '"ngx_upstream_response_time": "$upstream_response_time",'
            '"ngx_request_time": "$request_time",'
            '"http_referrer": "$http_referer",'
            '"http_user_agent": "$http_user_agent",'
            '"ngx_loc_in": "$loc_in",'
            '"ngx_loc_out": "$loc_out",'
            '"ngx_loc_in_out": "${loc_in}-${loc_out}"'
        '}'"#;

/// Directives that open the `http` block, before any listener.
pub fn preamble(nginx: &NginxConfig) -> Vec<Node> {
    let log_dir = nginx.log_dir.trim_end_matches('/');
    let mut nodes: Vec<Node> = [
        Directive::new(
            "server_names_hash_bucket_size",
            nginx.server_names_hash_bucket_size.to_string(),
        ),
        Directive::new("log_format", MAIN_FORMAT),
        Directive::new("log_format", AUTH_SERVICE_FORMAT),
        Directive::new("log_format", LOGSTASH_FORMAT),
        Directive::new("log_format", JSON_FORMAT),
        Directive::new("error_log", "/dev/stdout warn"),
        Directive::new("access_log", format!("{log_dir}/access.log json_combined")),
        Directive::new(
            "access_log",
            format!("{log_dir}/auth-service-format.log auth_service_format"),
        ),
        Directive::new(
            "access_log",
            format!("{log_dir}/nginx-logstash-format.log logstash_format"),
        ),
        Directive::new(
            "proxy_cache_path",
            format!("{} keys_zone={AUTH_REQUESTS_CACHE}:10m", nginx.auth_cache_path),
        ),
        Directive::new(
            "proxy_cache_path",
            format!(
                "{} keys_zone={SITE_CONTENT_CACHE}:10m max_size={}",
                nginx.content_cache_path, nginx.content_cache_max_size
            ),
        ),
        Directive::new("client_max_body_size", nginx.client_max_body_size.as_str()),
        Directive::new("proxy_set_header", "X-Forwarded-For $proxy_add_x_forwarded_for"),
    ]
    .into_iter()
    .map(Node::from)
    .collect();

    // `$empty` backs the catch-all listener's dummy certificate
    nodes.push(Block::with_args("map", "\"\" $empty").directive("default", "\"\"").into());
    nodes
}
