#![cfg_attr(not(feature = "std"), no_std, no_main)]

#[ink::contract]
mod realty_registry {
    use ink::prelude::string::String;
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;

    // Error types
    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum ContractError {
        /// Administrative operation attempted by an account that is not
        /// the contract owner.
        NotContractOwner,
        /// Per-record operation attempted by an account that is not the
        /// owner of the Realty.
        NotRealtyOwner,
        /// The registry id was never assigned or has been deregistered.
        UnknownRegistryId,
        /// Purchase attempted while the Realty is not Available.
        NotForSale,
        /// Purchase attempted with less value than the asking price.
        InsufficientValue,
        /// Withdrawal attempted with an empty pending balance.
        InsufficientFunds,
        /// The native transfer during withdrawal failed; the pending
        /// balance is restored before this is returned.
        TransferFailed,
    }

    pub type Result<T> = core::result::Result<T, ContractError>;

    #[derive(scale::Decode, scale::Encode, Clone, Copy, PartialEq, Eq, Debug, Default)]
    #[cfg_attr(
        feature = "std",
        derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
    )]
    pub enum RealtyState {
        #[default]
        Unavailable,
        Available,
    }

    #[derive(scale::Decode, scale::Encode, Clone, PartialEq, Eq, Debug)]
    #[cfg_attr(
        feature = "std",
        derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
    )]
    pub struct Realty {
        pub registry_id: u64,
        pub street_name: String,
        pub post_code: String,
        pub city: String,
        pub country: String,
        pub realty_type: String,
        pub state: RealtyState,
        pub price: Balance,
        pub owner: AccountId,
    }

    #[ink(storage)]
    pub struct RealtyRegistry {
        /// Administrative owner; the only account allowed to register
        /// and deregister.
        owner: AccountId,
        /// Next registry id to assign. Monotonic, ids are never reused.
        current_id: u64,
        /// Count of records currently registered.
        total_registrations: u64,
        id_to_realty: Mapping<u64, Realty>,
        /// Position of a registry id inside its owner's owned-list.
        index_of_realty: Mapping<u64, u32>,
        realty_owned: Mapping<AccountId, Vec<u64>>,
        /// Escrow ledger: balances credited by purchases, paid out only
        /// through `withdraw_funds`.
        pending_withdrawals: Mapping<AccountId, Balance>,
    }

    #[ink(event)]
    pub struct ContractCreated {
        #[ink(topic)]
        pub owner: AccountId,
    }

    #[ink(event)]
    pub struct OwnershipTransferred {
        #[ink(topic)]
        pub previous_owner: AccountId,
        #[ink(topic)]
        pub new_owner: AccountId,
    }

    #[ink(event)]
    pub struct RegistrationAdded {
        #[ink(topic)]
        pub registry_id: u64,
        #[ink(topic)]
        pub owner: AccountId,
    }

    #[ink(event)]
    pub struct RegistrationRemoved {
        #[ink(topic)]
        pub registry_id: u64,
    }

    #[ink(event)]
    pub struct RealtyStateChanged {
        #[ink(topic)]
        pub registry_id: u64,
        pub new_state: RealtyState,
    }

    #[ink(event)]
    pub struct RealtyPriceUpdated {
        #[ink(topic)]
        pub registry_id: u64,
        pub price: Balance,
    }

    #[ink(event)]
    pub struct RealtyPurchased {
        #[ink(topic)]
        pub registry_id: u64,
        pub price: Balance,
        #[ink(topic)]
        pub purchaser: AccountId,
    }

    #[ink(event)]
    pub struct RealtyTransferred {
        #[ink(topic)]
        pub registry_id: u64,
        #[ink(topic)]
        pub from: AccountId,
        #[ink(topic)]
        pub to: AccountId,
    }

    #[ink(event)]
    pub struct FundsDeposited {
        pub amount: Balance,
        #[ink(topic)]
        pub owner: AccountId,
    }

    #[ink(event)]
    pub struct FundsWithdrawn {
        pub amount: Balance,
        #[ink(topic)]
        pub withdrawer: AccountId,
    }

    impl RealtyRegistry {
        #[ink(constructor)]
        pub fn new() -> Self {
            let caller = Self::env().caller();

            Self::env().emit_event(ContractCreated { owner: caller });

            Self {
                owner: caller,
                current_id: 0,
                total_registrations: 0,
                id_to_realty: Mapping::default(),
                index_of_realty: Mapping::default(),
                realty_owned: Mapping::default(),
                pending_withdrawals: Mapping::default(),
            }
        }

        #[ink(constructor)]
        pub fn default() -> Self {
            Self::new()
        }

        //
        // === REGISTRATION ===
        //

        #[ink(message)]
        pub fn register(
            &mut self,
            street_name: String,
            post_code: String,
            city: String,
            country: String,
            realty_type: String,
            price: Balance,
            owner_address: AccountId,
        ) -> Result<u64> {
            let caller = self.env().caller();
            if caller != self.owner {
                return Err(ContractError::NotContractOwner);
            }

            let registry_id = self.current_id;
            let realty = Realty {
                registry_id,
                street_name,
                post_code,
                city,
                country,
                realty_type,
                state: RealtyState::Unavailable,
                price,
                owner: owner_address,
            };

            self.id_to_realty.insert(registry_id, &realty);
            self.append_to_owned(owner_address, registry_id);
            self.current_id = self.current_id.saturating_add(1);
            self.total_registrations = self.total_registrations.saturating_add(1);

            self.env().emit_event(RegistrationAdded {
                registry_id,
                owner: owner_address,
            });

            Ok(registry_id)
        }

        #[ink(message)]
        pub fn deregister(&mut self, registry_id: u64) -> Result<()> {
            let caller = self.env().caller();
            if caller != self.owner {
                return Err(ContractError::NotContractOwner);
            }

            let realty = self
                .id_to_realty
                .get(registry_id)
                .ok_or(ContractError::UnknownRegistryId)?;

            self.remove_from_owned(realty.owner, registry_id);
            self.id_to_realty.remove(registry_id);
            // current_id stays untouched: ids are never reused.
            self.total_registrations = self.total_registrations.saturating_sub(1);

            self.env().emit_event(RegistrationRemoved { registry_id });

            Ok(())
        }

        //
        // === REALTY OWNER OPERATIONS ===
        //

        #[ink(message)]
        pub fn change_availability(&mut self, registry_id: u64) -> Result<()> {
            let caller = self.env().caller();
            let mut realty = self
                .id_to_realty
                .get(registry_id)
                .ok_or(ContractError::UnknownRegistryId)?;
            if caller != realty.owner {
                return Err(ContractError::NotRealtyOwner);
            }

            realty.state = match realty.state {
                RealtyState::Unavailable => RealtyState::Available,
                RealtyState::Available => RealtyState::Unavailable,
            };
            self.id_to_realty.insert(registry_id, &realty);

            self.env().emit_event(RealtyStateChanged {
                registry_id,
                new_state: realty.state,
            });

            Ok(())
        }

        #[ink(message)]
        pub fn change_price(&mut self, registry_id: u64, new_price: Balance) -> Result<()> {
            let caller = self.env().caller();
            let mut realty = self
                .id_to_realty
                .get(registry_id)
                .ok_or(ContractError::UnknownRegistryId)?;
            if caller != realty.owner {
                return Err(ContractError::NotRealtyOwner);
            }

            realty.price = new_price;
            self.id_to_realty.insert(registry_id, &realty);

            self.env().emit_event(RealtyPriceUpdated {
                registry_id,
                price: new_price,
            });

            Ok(())
        }

        //
        // === PURCHASE & ESCROW ===
        //

        #[ink(message, payable)]
        pub fn purchase_registration(&mut self, registry_id: u64) -> Result<()> {
            let purchaser = self.env().caller();
            let value = self.env().transferred_value();

            let mut realty = self
                .id_to_realty
                .get(registry_id)
                .ok_or(ContractError::UnknownRegistryId)?;
            if realty.state != RealtyState::Available {
                return Err(ContractError::NotForSale);
            }
            if value < realty.price {
                return Err(ContractError::InsufficientValue);
            }

            let seller = realty.owner;
            let price = realty.price;
            let excess = value.saturating_sub(price);

            // The sale price is credited to the seller and any excess
            // back to the purchaser; both are paid out through
            // `withdraw_funds`, never pushed during the purchase.
            self.credit(seller, price);
            if excess > 0 {
                self.credit(purchaser, excess);
            }

            self.remove_from_owned(seller, registry_id);
            self.append_to_owned(purchaser, registry_id);

            realty.owner = purchaser;
            realty.state = RealtyState::Unavailable;
            self.id_to_realty.insert(registry_id, &realty);

            self.env().emit_event(RealtyPurchased {
                registry_id,
                price,
                purchaser,
            });
            self.env().emit_event(RealtyTransferred {
                registry_id,
                from: seller,
                to: purchaser,
            });
            self.env().emit_event(FundsDeposited {
                amount: price,
                owner: seller,
            });

            Ok(())
        }

        #[ink(message)]
        pub fn withdraw_funds(&mut self) -> Result<()> {
            let caller = self.env().caller();

            let amount = self.pending_withdrawals.get(caller).unwrap_or(0);
            if amount == 0 {
                return Err(ContractError::InsufficientFunds);
            }

            // Debit before the transfer; restore the balance if the
            // transfer itself fails.
            self.pending_withdrawals.remove(caller);
            if self.env().transfer(caller, amount).is_err() {
                self.pending_withdrawals.insert(caller, &amount);
                return Err(ContractError::TransferFailed);
            }

            self.env().emit_event(FundsWithdrawn {
                amount,
                withdrawer: caller,
            });

            Ok(())
        }

        //
        // === OWNERSHIP ===
        //

        #[ink(message)]
        pub fn get_owner(&self) -> AccountId {
            self.owner
        }

        #[ink(message)]
        pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<()> {
            let caller = self.env().caller();
            if caller != self.owner {
                return Err(ContractError::NotContractOwner);
            }

            let previous_owner = self.owner;
            self.owner = new_owner;

            self.env().emit_event(OwnershipTransferred {
                previous_owner,
                new_owner,
            });

            Ok(())
        }

        //
        // === QUERIES ===
        //

        #[ink(message)]
        pub fn current_id(&self) -> u64 {
            self.current_id
        }

        #[ink(message)]
        pub fn total_registrations(&self) -> u64 {
            self.total_registrations
        }

        #[ink(message)]
        pub fn owner_of(&self, registry_id: u64) -> Option<AccountId> {
            self.id_to_realty.get(registry_id).map(|realty| realty.owner)
        }

        #[ink(message)]
        pub fn id_to_realty(&self, registry_id: u64) -> Option<Realty> {
            self.id_to_realty.get(registry_id)
        }

        #[ink(message)]
        pub fn realty_owned(&self, account: AccountId) -> Vec<u64> {
            self.realty_owned.get(account).unwrap_or_default()
        }

        #[ink(message)]
        pub fn index_of_realty(&self, registry_id: u64) -> Option<u32> {
            self.index_of_realty.get(registry_id)
        }

        #[ink(message)]
        pub fn pending_withdrawal_of(&self, account: AccountId) -> Balance {
            self.pending_withdrawals.get(account).unwrap_or(0)
        }

        //
        // === OWNED-LIST BOOKKEEPING ===
        //

        /// Append a registry id to an account's owned-list and record
        /// its position.
        fn append_to_owned(&mut self, account: AccountId, registry_id: u64) {
            let mut owned = self.realty_owned.get(account).unwrap_or_default();
            #[allow(clippy::cast_possible_truncation)]
            let index = owned.len() as u32;
            self.index_of_realty.insert(registry_id, &index);
            owned.push(registry_id);
            self.realty_owned.insert(account, &owned);
        }

        /// Remove a registry id from an account's owned-list. The last
        /// element is swapped into the freed slot and its recorded
        /// index updated, so removal never shifts the whole list.
        fn remove_from_owned(&mut self, account: AccountId, registry_id: u64) {
            let mut owned = self.realty_owned.get(account).unwrap_or_default();
            self.index_of_realty.remove(registry_id);

            let Some(position) = owned.iter().position(|id| *id == registry_id) else {
                return;
            };
            let last = owned.len().saturating_sub(1);
            if position < last {
                let moved = owned[last];
                owned[position] = moved;
                #[allow(clippy::cast_possible_truncation)]
                let index = position as u32;
                self.index_of_realty.insert(moved, &index);
            }
            owned.pop();

            if owned.is_empty() {
                self.realty_owned.remove(account);
            } else {
                self.realty_owned.insert(account, &owned);
            }
        }

        fn credit(&mut self, account: AccountId, amount: Balance) {
            let balance = self.pending_withdrawals.get(account).unwrap_or(0);
            self.pending_withdrawals
                .insert(account, &balance.saturating_add(amount));
        }
    }

}
