use super::{ValidationErrors, Validator};
use crate::domain::{
    Address, CategoryCreate, CategoryPatch, CheckoutRequest, PaymentCreate, ProductCreate, ProductPatch,
    UserCreate, UserPatch,
};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_DESCRIPTION_LEN: usize = 2_000;
const MAX_SKU_LEN: usize = 64;
/// Upper bound on a single stock figure, to keep cart and order math far from overflow.
pub const MAX_STOCK: u64 = 1_000_000;

/// Input that can check itself before reaching a service.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.rule_for("name", &self.name).not_empty().max_len(MAX_NAME_LEN);
        v.rule_for("email", &self.email).not_empty().max_len(MAX_EMAIL_LEN).email();
        v.finish()
    }
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.rule_for("name", name).not_empty().max_len(MAX_NAME_LEN);
        }
        if let Some(email) = &self.email {
            v.rule_for("email", email).not_empty().max_len(MAX_EMAIL_LEN).email();
        }
        v.finish()
    }
}

impl Validate for CategoryCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.rule_for("name", &self.name).not_empty().max_len(MAX_NAME_LEN);
        v.rule_for("slug", &self.slug).not_empty().max_len(MAX_NAME_LEN).slug();
        if let Some(description) = &self.description {
            v.rule_for("description", description).max_len(MAX_DESCRIPTION_LEN);
        }
        v.finish()
    }
}

impl Validate for CategoryPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.rule_for("name", name).not_empty().max_len(MAX_NAME_LEN);
        }
        if let Some(slug) = &self.slug {
            v.rule_for("slug", slug).not_empty().max_len(MAX_NAME_LEN).slug();
        }
        if let Some(description) = &self.description {
            v.rule_for("description", description).max_len(MAX_DESCRIPTION_LEN);
        }
        v.finish()
    }
}

impl Validate for ProductCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.rule_for("sku", &self.sku).not_empty().max_len(MAX_SKU_LEN);
        v.rule_for("name", &self.name).not_empty().max_len(MAX_NAME_LEN);
        if let Some(description) = &self.description {
            v.rule_for("description", description).max_len(MAX_DESCRIPTION_LEN);
        }
        v.rule_for_number("price", self.price.cents()).positive();
        v.rule_for_number("stock", u64::from(self.stock)).at_most(MAX_STOCK);
        v.rule_for("category_id", &self.category_id).not_empty();
        v.finish()
    }
}

impl Validate for ProductPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.rule_for("name", name).not_empty().max_len(MAX_NAME_LEN);
        }
        if let Some(description) = &self.description {
            v.rule_for("description", description).max_len(MAX_DESCRIPTION_LEN);
        }
        if let Some(price) = self.price {
            v.rule_for_number("price", price.cents()).positive();
        }
        if let Some(stock) = self.stock {
            v.rule_for_number("stock", u64::from(stock)).at_most(MAX_STOCK);
        }
        if let Some(category_id) = &self.category_id {
            v.rule_for("category_id", category_id).not_empty();
        }
        v.finish()
    }
}

impl Validate for Address {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.rule_for("recipient", &self.recipient).not_empty().max_len(MAX_NAME_LEN);
        v.rule_for("line1", &self.line1).not_empty().max_len(MAX_NAME_LEN);
        if let Some(line2) = &self.line2 {
            v.rule_for("line2", line2).max_len(MAX_NAME_LEN);
        }
        v.rule_for("city", &self.city).not_empty().max_len(MAX_NAME_LEN);
        v.rule_for("postal_code", &self.postal_code).not_empty().max_len(16);
        v.rule_for("country", &self.country).exact_len(2).uppercase_ascii();
        v.finish()
    }
}

impl Validate for CheckoutRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.rule_for("user_id", &self.user_id).not_empty();
        v.nested("shipping_address", &self.shipping_address);
        if let Some(billing) = &self.billing_address {
            v.nested("billing_address", billing);
        }
        v.finish()
    }
}

impl Validate for PaymentCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.rule_for("order_id", &self.order_id).not_empty();
        v.rule_for_number("amount", self.amount.cents()).positive();
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Money, PaymentProvider};

    #[test]
    fn test_user_create_rules() {
        assert!(UserCreate::customer("Ada", "ada@example.com").validate().is_ok());

        let err = UserCreate::customer(" ", "not-an-email").validate().unwrap_err();
        assert_eq!(err.for_field("name"), Some("must not be empty"));
        assert_eq!(err.for_field("email"), Some("must be a valid email address"));
    }

    #[test]
    fn test_empty_patch_is_valid() {
        assert!(UserPatch::default().validate().is_ok());
        assert!(ProductPatch::default().validate().is_ok());
        assert!(CategoryPatch::default().validate().is_ok());
    }

    #[test]
    fn test_product_requires_positive_price() {
        let product = ProductCreate::new("SKU-1", "Lamp", Money::ZERO, 3, "category_1");
        let err = product.validate().unwrap_err();
        assert_eq!(err.for_field("price"), Some("must be greater than zero"));
    }

    #[test]
    fn test_checkout_prefixes_address_fields() {
        let mut shipping = Address::new("Ada", "1 Loop Rd", "Springfield", "12345", "us");
        shipping.city.clear();
        let request = CheckoutRequest {
            user_id: "user_1".into(),
            shipping_address: shipping,
            billing_address: None,
            provider: PaymentProvider::Stripe,
        };

        let err = request.validate().unwrap_err();
        assert_eq!(err.for_field("shipping_address.city"), Some("must not be empty"));
        assert_eq!(
            err.for_field("shipping_address.country"),
            Some("must contain only uppercase letters")
        );
    }

    #[test]
    fn test_category_slug_rule() {
        let err = CategoryCreate::new("Home Office", "Home Office").validate().unwrap_err();
        assert!(err.for_field("slug").is_some());
        assert!(CategoryCreate::new("Home Office", "home-office").validate().is_ok());
    }
}
