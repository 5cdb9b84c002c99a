use mockall::automock;
use uuid::Uuid;

#[automock]
pub trait IdGenerator {
    fn generate(&self) -> Uuid;
}

pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}
