//! srvconf-check - Validate server configuration files.

fn main() -> std::process::ExitCode {
    srvconf::cmd::check::main()
}
