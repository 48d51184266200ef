pub mod account_scanner;
pub mod address_resolver;
pub mod secret_resolver;
pub mod vm_modules;

pub use account_scanner::{ActiveAccountScanner, ActivityQuery, RemoteSigner, ScanOptions};
pub use address_resolver::{AddressResolver, ResolveAddressesRequest, ResolvedAddresses};
pub use secret_resolver::SecretResolver;
pub use vm_modules::{VmModule, VmModuleRegistry};
