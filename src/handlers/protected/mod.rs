// handlers/protected/mod.rs - Handlers that require a verified bearer credential
//
// Authentication is not a router layer here: each handler passes the request
// headers to its service, which verifies the credential on every call.
pub mod users;
