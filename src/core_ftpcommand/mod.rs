// Here's the list of the FTP commands implemented. PASV and PORT live in
// core_network with the rest of the data-channel code.
pub mod allo;
pub mod cdup;
pub mod cwd;
pub mod dele;
pub mod feat;
pub mod list;
pub mod mdtm;
pub mod mkd;
pub mod noop;
pub mod pass;
pub mod pwd;
pub mod quit;
pub mod rest;
pub mod retr;
pub mod rmd;
pub mod rnfr;
pub mod rnto;
pub mod size;
pub mod stor;
pub mod syst;
pub mod type_;
pub mod user;

// Command parsing and the registry.
pub mod ftpcommand;
pub mod handlers;

#[cfg(test)]
mod test_commands;
