// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Free & Fair
// See LICENSE.md for details

//! Admin forms: the append-only list of user IDs with admin rights.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Parse a user ID string as a nonnegative integer SCIPER.
pub(crate) fn parse_user_id(user_id: &str) -> Result<u64, Error> {
    user_id
        .parse::<u64>()
        .map_err(|_| Error::InvalidUserId(user_id.to_string()))
}

/// The top-level admin record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdminForm {
    /// FormID is the hex-encoded SHA256 of the transaction ID that creates
    /// the form.
    pub form_id: String,

    /// List of user IDs with admin rights.
    pub admin_list: Vec<u64>,
}

impl AdminForm {
    /// Add a new admin to the system.
    ///
    /// # Errors
    ///
    /// - `InvalidUserId` if `user_id` does not parse as a nonnegative integer
    pub fn add_admin(&mut self, user_id: &str) -> Result<(), Error> {
        let id = parse_user_id(user_id)?;
        self.admin_list.push(id);

        Ok(())
    }

    /// Return the index of the admin if `user_id` is one.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> Option<usize> {
        let id = parse_user_id(user_id).ok()?;
        self.admin_list.iter().position(|admin| *admin == id)
    }

    /// Remove an admin from the system.
    ///
    /// # Errors
    ///
    /// - `InvalidUserId` if `user_id` does not parse as a nonnegative integer
    /// - `StoreFailure` if the user is not an admin
    pub fn remove_admin(&mut self, user_id: &str) -> Result<(), Error> {
        parse_user_id(user_id)?;

        let index = self
            .is_admin(user_id)
            .ok_or_else(|| Error::StoreFailure(format!("user {user_id} is not an admin")))?;
        self.admin_list.remove(index);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_remove_admin() {
        let mut form = AdminForm::default();

        form.add_admin("123456").unwrap();
        assert_eq!(form.is_admin("123456"), Some(0));

        form.remove_admin("123456").unwrap();
        assert_eq!(form.is_admin("123456"), None);
    }

    #[test]
    fn test_add_admin_rejects_non_integer() {
        let mut form = AdminForm::default();

        assert!(form.add_admin("not a number").is_err());
        assert!(form.add_admin("-3").is_err());
        assert!(form.is_admin("not a number").is_none());
    }

    #[test]
    fn test_remove_unknown_admin_fails() {
        let mut form = AdminForm::default();
        form.add_admin("1").unwrap();

        assert!(form.remove_admin("2").is_err());
        assert!(form.remove_admin("nope").is_err());
        assert_eq!(form.is_admin("1"), Some(0));
    }

    #[test]
    fn test_admin_indexes_follow_insertion_order() {
        let mut form = AdminForm::default();
        form.add_admin("10").unwrap();
        form.add_admin("20").unwrap();
        form.add_admin("30").unwrap();

        assert_eq!(form.is_admin("20"), Some(1));
        form.remove_admin("10").unwrap();
        assert_eq!(form.is_admin("20"), Some(0));
        assert_eq!(form.is_admin("30"), Some(1));
    }
}
