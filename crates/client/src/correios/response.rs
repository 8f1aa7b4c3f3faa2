//! Correios lookup response types and normalization.

use correios_cep_core::Address;
use serde::Deserialize;

/// Raw body returned by the Correios details endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LookupResponse {
    pub erro: bool,
    pub mensagem: String,
    pub total: i64,
    pub dados: Vec<Dado>,
}

/// One match in a Correios response.
///
/// Only the fields that feed [`Address`] plus a few descriptive ones are
/// modelled; anything else in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dado {
    pub uf: String,
    pub localidade: String,
    pub bairro: String,
    #[serde(rename = "logradouroDNEC")]
    pub logradouro_dnec: String,
    pub logradouro_texto: String,
    pub logradouro_texto_adicional: String,
    pub localidade_subordinada: String,
    pub nome_unidade: String,
    pub cep: String,
    pub tipo_cep: String,
    pub situacao: String,
}

impl Dado {
    /// Map onto an address, falling back to `cep` when the entry carries no
    /// code of its own.
    pub fn to_address(&self, cep: &str) -> Address {
        let own: String = self.cep.chars().filter(char::is_ascii_digit).collect();
        Address {
            cep: if own.is_empty() { cep.to_string() } else { own },
            state: self.uf.clone(),
            city: self.localidade.clone(),
            neighborhood: self.bairro.clone(),
            location: self.logradouro_dnec.clone(),
            ..Default::default()
        }
    }
}

impl LookupResponse {
    /// Normalize into one address for the queried `cep`.
    ///
    /// Returns `None` when there are no matches. The result is always keyed
    /// by `cep`. Several matches become an envelope holding one child per
    /// match; the envelope keeps `state` and `city` only when every child
    /// agrees on them.
    pub fn into_address(self, cep: &str) -> Option<Address> {
        match self.dados.as_slice() {
            [] => None,
            [only] => Some(Address { cep: cep.to_string(), ..only.to_address(cep) }),
            many => {
                let children: Vec<Address> = many.iter().map(|d| d.to_address(cep)).collect();

                Some(Address {
                    cep: cep.to_string(),
                    state: shared(&children, |a| &a.state),
                    city: shared(&children, |a| &a.city),
                    children,
                    ..Default::default()
                })
            }
        }
    }
}

/// Value of `field` when every address agrees on it, else empty.
fn shared(addresses: &[Address], field: fn(&Address) -> &String) -> String {
    match addresses.split_first() {
        Some((first, rest)) if rest.iter().all(|a| field(a) == field(first)) => field(first).clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_JSON: &str = r#"{
        "erro": false,
        "mensagem": "DADOS ENCONTRADOS COM SUCESSO.",
        "total": 1,
        "dados": [
            {
                "uf": "SP",
                "localidade": "São Paulo",
                "locNoSem": "",
                "locNu": "",
                "localidadeSubordinada": "",
                "logradouroDNEC": "Praça da Sé - lado ímpar",
                "logradouroTextoAdicional": "",
                "logradouroTexto": "",
                "bairro": "Sé",
                "baiNu": "",
                "nomeUnidade": "",
                "cep": "01001000",
                "tipoCep": "2",
                "numeroLocalidade": "",
                "situacao": "",
                "faixasCaixaPostal": [],
                "faixasCep": []
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_single() {
        let response: LookupResponse = serde_json::from_str(SINGLE_JSON).unwrap();
        assert!(!response.erro);
        assert_eq!(response.total, 1);
        assert_eq!(response.dados.len(), 1);
        assert_eq!(response.dados[0].logradouro_dnec, "Praça da Sé - lado ímpar");
    }

    #[test]
    fn test_single_match_maps_fields() {
        let response: LookupResponse = serde_json::from_str(SINGLE_JSON).unwrap();
        let address = response.into_address("01001000").unwrap();

        assert_eq!(address.cep, "01001000");
        assert_eq!(address.state, "SP");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.neighborhood, "Sé");
        assert_eq!(address.location, "Praça da Sé - lado ímpar");
        assert!(address.children.is_empty());
        assert!(address.created_at.is_none());
    }

    #[test]
    fn test_single_match_keyed_by_queried_cep() {
        let json = r#"{"dados": [{"uf": "SP", "localidade": "São Paulo", "cep": "01001-001"}]}"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        let address = response.into_address("01001000").unwrap();

        assert_eq!(address.cep, "01001000");
        assert_eq!(address.city, "São Paulo");
    }

    #[test]
    fn test_empty_dados_is_none() {
        let json = r#"{"erro": true, "mensagem": "DADOS NAO ENCONTRADOS", "total": 0, "dados": []}"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_address("99999999").is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let response: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(response.dados.is_empty());
        assert!(response.into_address("01001000").is_none());
    }

    #[test]
    fn test_multiple_matches_nest_children() {
        let json = r#"{"total": 2, "dados": [
            {"uf": "SP", "localidade": "São Paulo", "bairro": "Sé", "logradouroDNEC": "Rua A", "cep": "01001-000"},
            {"uf": "SP", "localidade": "São Paulo", "bairro": "Centro", "logradouroDNEC": "Rua B", "cep": ""}
        ]}"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        let address = response.into_address("01001000").unwrap();

        assert_eq!(address.cep, "01001000");
        assert_eq!(address.state, "SP");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.neighborhood, "");
        assert_eq!(address.children.len(), 2);
        assert_eq!(address.children[0].cep, "01001000");
        assert_eq!(address.children[0].location, "Rua A");
        assert_eq!(address.children[1].cep, "01001000");
        assert_eq!(address.children[1].neighborhood, "Centro");
    }

    #[test]
    fn test_envelope_drops_disagreeing_city() {
        let json = r#"{"dados": [
            {"uf": "MG", "localidade": "Belo Horizonte", "cep": "30000000"},
            {"uf": "MG", "localidade": "Contagem", "cep": "30000000"}
        ]}"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        let address = response.into_address("30000000").unwrap();

        assert_eq!(address.state, "MG");
        assert_eq!(address.city, "");
    }
}
