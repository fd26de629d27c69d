// Camada de domínio: modelos e portas (interfaces). Sem dependências de I/O.

pub mod model;
pub mod places;
pub mod ports;
