//! The builtin schema set
//!
//! Each schema carries a `urn:jsonschema:<name>` id; validators are looked up
//! by the last id segment. The `nodes` schema is the flat array of pages and
//! refers to `page` for its items.

use serde_json::{json, Value};

pub const PAGE: &str = "page";
pub const NODES: &str = "nodes";
pub const IMPORTMAP: &str = "importmap";
pub const CREDENTIALS: &str = "credentials";
pub const FONTS: &str = "fonts";
pub const FEED: &str = "feed";
pub const LOG: &str = "log";

/// All builtin schemas, in registration order
pub fn builtin() -> Vec<Value> {
    vec![
        credentials(),
        nodes(),
        page(),
        importmap(),
        feed(),
        fonts(),
        log(),
    ]
}

pub fn page() -> Value {
    json!({
        "$id": "urn:jsonschema:page",
        "type": "object",
        "additionalProperties": false,
        "dynamicDefaults": { "id": "uuid" },
        "properties": {
            "id": { "type": "string" },
            "name": { "type": "string", "nullable": true, "default": null },
            "header": { "type": "string" },
            "icon": { "type": "string" },
            "loc": { "type": "string", "nullable": true, "default": null },
            "enabled": { "type": "boolean", "default": true },
            "flat": { "type": "boolean", "default": true },
            "children": {
                "type": "array",
                "items": { "type": "object" },
                "default": []
            },
            "type": {
                "type": "string",
                "nullable": true,
                "default": null,
                "enum": [
                    "article",
                    "book",
                    "profile",
                    "website",
                    "music.song",
                    "music.album",
                    "music.playlist",
                    "music.radio_station",
                    "video.movie",
                    "video.episode",
                    "video.tv_show",
                    "video.other",
                    null
                ]
            },
            "changefreq": {
                "type": "string",
                "nullable": true,
                "default": null,
                "enum": ["always", "hourly", "daily", "weekly", "monthly", "yearly", "never", null]
            },
            "priority": {
                "type": "number",
                "nullable": true,
                "default": null,
                "minimum": 0,
                "maximum": 1
            },
            "images": {
                "type": "array",
                "default": [],
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "url": { "type": "string", "default": "" },
                        "alt": { "type": "string" }
                    }
                }
            },
            "class": {
                "type": "array",
                "items": { "type": "string" },
                "default": ["prose", "max-w-none"]
            },
            "keywords": {
                "type": "array",
                "items": { "type": "string" },
                "default": []
            },
            "description": { "type": "string", "nullable": true, "default": null },
            "lastmod": { "type": "string", "nullable": true, "default": null },
            "frontmatter": { "type": "object", "default": {} }
        }
    })
}

pub fn nodes() -> Value {
    json!({
        "$id": "urn:jsonschema:nodes",
        "type": "array",
        "items": { "$ref": "urn:jsonschema:page" }
    })
}

pub fn importmap() -> Value {
    json!({
        "$id": "urn:jsonschema:importmap",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "imports": {
                "type": "object",
                "additionalProperties": { "type": "string" },
                "default": {}
            },
            "scopes": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                }
            }
        }
    })
}

pub fn credentials() -> Value {
    json!({
        "$id": "urn:jsonschema:credentials",
        "type": "object",
        "additionalProperties": {
            "type": "object",
            "properties": {
                "accessKeyId": { "type": "string", "nullable": true, "default": null },
                "Bucket": { "type": "string", "nullable": true, "default": null },
                "endpoint": { "type": "string", "nullable": true, "default": null },
                "region": { "type": "string", "nullable": true, "default": null },
                "secretAccessKey": { "type": "string", "nullable": true, "default": null }
            }
        }
    })
}

pub fn fonts() -> Value {
    json!({
        "$id": "urn:jsonschema:fonts",
        "type": "array",
        "items": { "type": "string" }
    })
}

pub fn feed() -> Value {
    json!({
        "$id": "urn:jsonschema:feed",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "version": {
                "type": "string",
                "enum": [
                    "https://jsonfeed.org/version/1",
                    "https://jsonfeed.org/version/1.1"
                ],
                "default": "https://jsonfeed.org/version/1"
            },
            "title": { "type": "string", "default": "" },
            "home_page_url": { "type": "string" },
            "feed_url": { "type": "string" },
            "items": {
                "type": "array",
                "default": [],
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "dynamicDefaults": { "date_published": "datetime", "id": "uuid" },
                    "properties": {
                        "id": { "type": "string" },
                        "url": { "type": "string" },
                        "title": { "type": "string", "default": "" },
                        "content_html": { "type": "string", "default": "" },
                        "date_published": { "type": "string" },
                        "attachments": {
                            "type": "array",
                            "default": [],
                            "items": {
                                "type": "object",
                                "additionalProperties": false,
                                "properties": {
                                    "url": { "type": "string", "default": "" },
                                    "mime_type": { "type": "string", "default": "" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

pub fn log() -> Value {
    json!({
        "$id": "urn:jsonschema:log",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "system": { "type": "string", "default": "" },
            "messages": {
                "type": "array",
                "default": [],
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "role": {
                            "type": "string",
                            "enum": ["user", "assistant", "system"],
                            "default": "user"
                        },
                        "content": {
                            "type": "array",
                            "default": [],
                            "items": {
                                "type": "object",
                                "additionalProperties": false,
                                "properties": {
                                    "type": { "type": "string", "default": "text" },
                                    "text": { "type": "string", "default": "" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
